//! Header redaction for log output.

/// Value written in place of an `Authorization` header.
pub const MASK: &str = "*";

/// Masks credentials in a raw header dump before it is logged.
///
/// The dump is split on CRLF; every line whose header name is
/// `Authorization` becomes `Authorization: *`, and the lines are joined back
/// with CRLF. The name comparison ignores ASCII case, so a dump with
/// lowercase names (HTTP/2, hand-written) is masked too. Other lines,
/// including the request line, pass through untouched.
pub fn redact_headers(dump: &str) -> String {
    dump.split("\r\n")
        .map(|line| match line.split_once(':') {
            Some((name, _)) if name.eq_ignore_ascii_case("authorization") => {
                format!("{name}: {MASK}")
            }
            _ => line.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}
