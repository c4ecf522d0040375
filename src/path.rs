//! Path Safety
//!
//! Lexical checks for caller-supplied paths. Nothing here touches the
//! filesystem: the path is judged purely as a string so the decision is the
//! same whether or not the file exists.
//!
//! Traversal detection is deliberately coarse. Any literal `..` is rejected,
//! including filenames such as `notes..txt` that never leave their directory.

use crate::dialect::Dialect;
use crate::error::{PlatformPathViolation, ValidationError};
use crate::shell::{check_length, check_null_bytes, printable, MAX_PATH_LEN};

const PATH_LABEL: &str = "path";

/// Shell metacharacters rejected in paths.
///
/// Narrower than the argument set: globs, brackets and backslashes are
/// legitimate in filenames and Windows separators.
pub const PATH_METACHARACTERS: &[&str] = &[
    ";", "&", "|", "`", "$", "(", ")", "{", "}", "<", ">", "\n", "\r",
];

/// Device names Windows reserves in every directory
pub const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Characters Windows forbids in filenames (after any drive prefix)
pub const WINDOWS_INVALID_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Validate a path for the given dialect
pub fn check_path(path: &str, dialect: Dialect) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::Empty {
            field: PATH_LABEL.to_string(),
        });
    }

    check_length(path, PATH_LABEL, MAX_PATH_LEN)?;
    check_null_bytes(path, PATH_LABEL)?;

    if path.contains("..") {
        return Err(ValidationError::PathTraversal {
            path: path.to_string(),
        });
    }

    if let Some(sequence) = PATH_METACHARACTERS.iter().find(|seq| path.contains(**seq)) {
        return Err(ValidationError::ForbiddenChars {
            field: PATH_LABEL.to_string(),
            sequence: printable(sequence),
        });
    }

    if dialect.is_windows() {
        check_windows_path(path).map_err(|violation| ValidationError::PlatformPath {
            path: path.to_string(),
            violation,
        })?;
    }

    Ok(())
}

/// Windows filename rules, in the order they are reported
fn check_windows_path(path: &str) -> Result<(), PlatformPathViolation> {
    if is_unc(path) {
        return Err(PlatformPathViolation::UncPath);
    }

    let colons = path.matches(':').count();
    if colons > 1 {
        return Err(PlatformPathViolation::AlternateDataStream);
    }
    let has_drive = has_drive_prefix(path);
    if colons == 1 && !has_drive {
        return Err(PlatformPathViolation::InvalidColon);
    }

    let rest = if has_drive { &path[2..] } else { path };

    if let Some(name) = reserved_device_name(rest) {
        return Err(PlatformPathViolation::ReservedDeviceName(name.to_string()));
    }

    if let Some(c) = rest.chars().find(|c| WINDOWS_INVALID_CHARS.contains(c)) {
        return Err(PlatformPathViolation::InvalidCharacter(c));
    }

    if has_trailing_dot_or_space(rest) {
        return Err(PlatformPathViolation::TrailingDotOrSpace);
    }

    Ok(())
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// `\\server\share`, and the `//server/share` spelling Windows also accepts
fn is_unc(path: &str) -> bool {
    let mut chars = path.chars();
    matches!((chars.next(), chars.next()), (Some(a), Some(b)) if is_separator(a) && is_separator(b))
}

/// `C:` style prefix
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Reserved device name of the final segment, if it is one.
///
/// `CON.txt` and `con.tar.gz` both open the console, so everything from the
/// first dot on is ignored, as are trailing spaces before it.
fn reserved_device_name(path: &str) -> Option<&'static str> {
    let segment = path.rsplit(is_separator).next().unwrap_or(path);
    let stem = segment.split('.').next().unwrap_or(segment).trim_end_matches(' ');
    let upper = stem.to_ascii_uppercase();

    RESERVED_DEVICE_NAMES
        .iter()
        .find(|name| **name == upper)
        .copied()
}

/// Windows silently strips trailing dots and spaces from each component,
/// so `secret.txt.` names the same file as `secret.txt`.
fn has_trailing_dot_or_space(path: &str) -> bool {
    path.split(is_separator)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .any(|segment| segment.ends_with('.') || segment.ends_with(' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn violation(path: &str) -> PlatformPathViolation {
        match check_path(path, Dialect::Windows) {
            Err(ValidationError::PlatformPath { violation, .. }) => violation,
            other => panic!("expected platform violation for {:?}, got {:?}", path, other),
        }
    }

    #[test]
    fn test_ordinary_paths_accepted() {
        for dialect in [Dialect::Posix, Dialect::Windows] {
            assert!(check_path("src/main.rs", dialect).is_ok());
            assert!(check_path("./config.toml", dialect).is_ok());
            assert!(check_path(".", dialect).is_ok());
            assert!(check_path("package.tar.gz", dialect).is_ok());
        }
        assert!(check_path("/var/log/app.log", Dialect::Posix).is_ok());
        assert!(check_path("C:\\Users\\dev\\pkg.zip", Dialect::Windows).is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        let err = check_path("../../../etc/passwd", Dialect::Posix).unwrap_err();
        assert!(err.to_string().contains("path traversal"));
        assert_eq!(err.category(), ErrorCategory::PathTraversal);

        assert!(check_path("..", Dialect::Posix).is_err());
        assert!(check_path("...", Dialect::Posix).is_err());
        assert!(check_path("dir\\..\\secret", Dialect::Windows).is_err());
    }

    #[test]
    fn test_double_dot_in_filename_rejected() {
        let err = check_path("notes..txt", Dialect::Posix).unwrap_err();
        assert!(matches!(err, ValidationError::PathTraversal { .. }));
    }

    #[test]
    fn test_unicode_lookalikes_not_treated_as_traversal() {
        // U+2024 ONE DOT LEADER and U+2215 DIVISION SLASH
        assert!(check_path("\u{2024}\u{2024}\u{2215}etc", Dialect::Posix).is_ok());
    }

    #[test]
    fn test_path_metacharacters() {
        for bad in ["a;b", "a&b", "a|b", "a`b", "$HOME/x", "a(b)", "{a}", "<in", "out>", "a\nb"] {
            let err = check_path(bad, Dialect::Posix).unwrap_err();
            assert!(
                err.to_string().contains("forbidden character"),
                "{:?} not rejected",
                bad
            );
        }
        // Globs and brackets are legal filename characters on POSIX
        assert!(check_path("logs/[2024]*.txt", Dialect::Posix).is_ok());
    }

    #[test]
    fn test_length_and_null_byte() {
        let long = "a".repeat(MAX_PATH_LEN + 1);
        let err = check_path(&long, Dialect::Posix).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum length"));

        let err = check_path("file\0.txt", Dialect::Posix).unwrap_err();
        assert!(err.to_string().contains("contains null bytes"));
    }

    #[test]
    fn test_path_at_maximum_length() {
        let max = "a".repeat(MAX_PATH_LEN);
        assert!(check_path(&max, Dialect::Posix).is_ok());
        assert!(check_path(&max, Dialect::Windows).is_ok());
    }

    #[test]
    fn test_reserved_names_only_on_windows() {
        assert!(check_path("CON.txt", Dialect::Posix).is_ok());

        let err = check_path("CON.txt", Dialect::Windows).unwrap_err();
        assert!(err.to_string().contains("reserved device name"));

        for name in ["nul", "dir\\PRN", "aux.tar.gz", "COM1", "lpt9.log", "out/CON "] {
            assert!(
                matches!(violation(name), PlatformPathViolation::ReservedDeviceName(_)),
                "{:?} not rejected",
                name
            );
        }

        assert!(check_path("COM10", Dialect::Windows).is_ok());
        assert!(check_path("CONSOLE.txt", Dialect::Windows).is_ok());
    }

    #[test]
    fn test_unc_paths() {
        assert_eq!(violation("\\\\server\\share"), PlatformPathViolation::UncPath);
        assert_eq!(violation("//server/share"), PlatformPathViolation::UncPath);
        assert!(check_path("\\\\server\\share", Dialect::Windows)
            .unwrap_err()
            .to_string()
            .contains("UNC paths are not allowed"));
        assert!(check_path("//server/share", Dialect::Posix).is_ok());
    }

    #[test]
    fn test_colon_rules() {
        assert!(check_path("C:\\data\\file.txt", Dialect::Windows).is_ok());
        assert!(check_path("d:relative.txt", Dialect::Windows).is_ok());

        let err = check_path("C:\\file.txt:hidden", Dialect::Windows).unwrap_err();
        assert!(err.to_string().contains("alternate data streams are not allowed"));

        let err = check_path("file.txt:stream", Dialect::Windows).unwrap_err();
        assert!(err.to_string().contains("invalid use of colon"));

        assert_eq!(violation("1:\\file"), PlatformPathViolation::InvalidColon);
        assert!(check_path("file.txt:stream", Dialect::Posix).is_ok());
    }

    #[test]
    fn test_invalid_windows_characters() {
        let err = check_path("report?.txt", Dialect::Windows).unwrap_err();
        assert!(err.to_string().contains("invalid Windows filename character"));
        assert_eq!(violation("a\"b"), PlatformPathViolation::InvalidCharacter('"'));
        assert_eq!(violation("C:\\*.log"), PlatformPathViolation::InvalidCharacter('*'));
    }

    #[test]
    fn test_trailing_dots_and_spaces() {
        let err = check_path("secret.txt.", Dialect::Windows).unwrap_err();
        assert!(err.to_string().contains("trailing dots or spaces"));
        assert_eq!(violation("secret.txt "), PlatformPathViolation::TrailingDotOrSpace);
        assert_eq!(violation("dir. \\file"), PlatformPathViolation::TrailingDotOrSpace);

        assert!(check_path(".\\file.txt", Dialect::Windows).is_ok());
        assert!(check_path("secret.txt.", Dialect::Posix).is_ok());
    }
}
