//! Output filename sanitization.

const NAME_MAX: usize = 255;

/// Makes a user-supplied output name safe to join onto the output directory.
///
/// Path separators, NUL and control characters become `_`, runs of `_` collapse
/// to one, surrounding dots/whitespace/underscores are dropped and the result is
/// cut to 255 bytes on a char boundary.
pub fn sanitize_output_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if matches!(c, '/' | '\\' | '\0') || c.is_control() {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace());
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
