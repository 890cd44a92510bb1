//! Specifier grammar and lexical path canonicalization
//!
//! Local module keys are virtual absolute paths inside the file table;
//! they never touch the host filesystem. Canonicalization is purely
//! lexical (`.` and `..` segments), so two relative specifiers naming the
//! same file collapse to one key. The accepted alphabet is exactly the
//! set the identifier encoding in `mangle` covers: alphanumerics plus
//! `/`, `.`, `-`, `_`.

/// Whether a specifier names a local file rather than a library module.
/// Local specifiers are relative (`./`, `../`) or absolute (`/`);
/// everything else is a flat library name.
pub fn is_local(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// Checks a local specifier against the path grammar.
pub fn check_specifier(specifier: &str) -> Result<(), String> {
    if specifier.is_empty() {
        return Err("empty specifier".to_string());
    }
    if let Some(ch) = specifier
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '/' | '.' | '-' | '_'))
    {
        return Err(format!("character '{}' is not allowed in module paths", ch));
    }
    if specifier.contains("//") {
        return Err("consecutive '/' separators".to_string());
    }
    if specifier.ends_with('/') {
        return Err("trailing '/' separator".to_string());
    }
    Ok(())
}

/// Checks a library module name: same alphabet as paths, minus the
/// separator (library names are flat).
pub fn check_library_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty library name".to_string());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
    {
        return Err(format!(
            "character '{}' is not allowed in library names",
            ch
        ));
    }
    Ok(())
}

/// Resolves a local specifier against the importing file's path and
/// canonicalizes the result. `importer` must already be canonical.
pub fn resolve(specifier: &str, importer: &str) -> Result<String, String> {
    if specifier.starts_with('/') {
        return normalize(specifier);
    }
    let dir = match importer.rfind('/') {
        Some(0) | None => "",
        Some(idx) => &importer[..idx],
    };
    normalize(&format!("{}/{}", dir, specifier))
}

/// Lexically canonicalizes an absolute path: resolves `.` and `..`
/// segments against the table root at `/`.
pub fn normalize(path: &str) -> Result<String, String> {
    if !path.starts_with('/') {
        return Err("path is not absolute".to_string());
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/').skip(1) {
        match segment {
            "" => return Err("empty path segment".to_string()),
            "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err("path escapes the table root".to_string());
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err("path names the root, not a file".to_string());
    }

    Ok(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_detection() {
        assert!(is_local("./a.mica"));
        assert!(is_local("../a.mica"));
        assert!(is_local("/a.mica"));
        assert!(!is_local("strings"));
        assert!(!is_local("a.mica"));
    }

    #[test]
    fn test_grammar_rejects_bad_characters() {
        assert!(check_specifier("./ok-file_1.mica").is_ok());
        assert!(check_specifier("./sp ace.mica").is_err());
        assert!(check_specifier("./uni\u{e9}.mica").is_err());
        assert!(check_specifier("./semi;colon").is_err());
    }

    #[test]
    fn test_grammar_rejects_consecutive_separators() {
        assert!(check_specifier("/a//b.mica").is_err());
        assert!(check_specifier("/a/b.mica").is_ok());
    }

    #[test]
    fn test_relative_resolution() {
        assert_eq!(resolve("./b.mica", "/a.mica").unwrap(), "/b.mica");
        assert_eq!(resolve("./c.mica", "/x/a.mica").unwrap(), "/x/c.mica");
        assert_eq!(resolve("../c.mica", "/x/a.mica").unwrap(), "/c.mica");
        assert_eq!(resolve("/d/e.mica", "/x/a.mica").unwrap(), "/d/e.mica");
    }

    #[test]
    fn test_two_spellings_one_key() {
        let direct = resolve("./lib/util.mica", "/main.mica").unwrap();
        let indirect = resolve("../lib/util.mica", "/lib/other.mica").unwrap();
        assert_eq!(direct, indirect);
    }

    #[test]
    fn test_escape_above_root_rejected() {
        assert!(resolve("../../x.mica", "/a.mica").is_err());
        assert!(normalize("/../x.mica").is_err());
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(normalize("/a/./b/../c.mica").unwrap(), "/a/c.mica");
    }

    #[test]
    fn test_library_names() {
        assert!(check_library_name("strings").is_ok());
        assert!(check_library_name("my-lib_2.0").is_ok());
        assert!(check_library_name("bad/name").is_err());
        assert!(check_library_name("").is_err());
    }
}
