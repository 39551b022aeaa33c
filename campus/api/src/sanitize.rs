const MAX_LEN: usize = 50;

/// Turns arbitrary text into a lowercase, dash separated token that is safe to
/// use as a file name.
pub fn sanitize_title(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut pending_dash = false;

	// One char in, one char out: `İ` lowers to `i`, not `i` plus a combining dot.
	for c in text.chars().filter_map(|c| c.to_lowercase().next()) {
		if c.is_ascii_lowercase() || c.is_ascii_digit() {
			if pending_dash && !out.is_empty() {
				out.push('-');
			}
			pending_dash = false;
			out.push(c);
		} else {
			pending_dash = true;
		}
	}

	// Only ascii is pushed, so byte truncation is safe.
	out.truncate(MAX_LEN);
	let out = out.trim_end_matches('-');

	if out.is_empty() {
		"untitled".to_string()
	} else {
		out.to_string()
	}
}

/// Builds the file name for a user owned asset, e.g. `profile-picture-UID42`.
pub fn sanitize_user_id_filename(prefix: &str, id: i64) -> String {
	let mut out = format!("{prefix}{id}");
	out.retain(|c| c.is_ascii_alphanumeric() || c == '-');
	out.truncate(MAX_LEN);

	if out.is_empty() {
		"profile-picture-UID0".to_string()
	} else {
		out
	}
}
