const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const WINDOWS_RESERVED: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];
const MAX_LEN: usize = 255;

/// Turn an arbitrary string (a phonebook name, a header value) into a safe file name.
///
/// Reserved and control characters become `replacement`, runs of it collapse
/// into one, and it is stripped from both ends.
pub fn sanitize_filename(input: &str, replacement: char) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if RESERVED.contains(&c) || c.is_control() {
            replacement
        } else {
            c
        };
        if c == replacement && out.ends_with(replacement) {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(replacement);
    let mut name = if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        replacement.to_string()
    } else {
        trimmed.to_owned()
    };

    let stem = name.split('.').next().unwrap_or_default().to_ascii_lowercase();
    if WINDOWS_RESERVED.contains(&stem.as_str()) {
        name.push(replacement);
    }

    if name.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}
