//! Module key to identifier encoding.
//!
//! Linked output binds one unit function and one result value per
//! module, so every module key needs a stable spelling that is a valid
//! identifier and collides with nothing a program can write (user code
//! cannot contain `__`-bracketed names of this shape because `_s_`,
//! `_d_` and `_h_` only arise from this encoding).

use crate::table::ModuleKey;

/// Runtime helper invoked for named and default import accesses.
pub const ACCESSOR: &str = "__access";
/// Runtime helper that builds a namespace object from a unit result.
pub const NAMESPACE: &str = "__namespace";
/// Runtime helper that materializes a library module by name.
pub const LIBRARY_LOADER: &str = "__library";

/// Maps a canonical key to identifier characters: `/` becomes `_s_`,
/// `.` becomes `_d_`, `-` becomes `_h_`; alphanumerics and `_` pass
/// through.
pub fn encode(key: &ModuleKey) -> String {
    let mut out = String::with_capacity(key.as_str().len() * 2);
    for ch in key.as_str().chars() {
        match ch {
            '/' => out.push_str("_s_"),
            '.' => out.push_str("_d_"),
            '-' => out.push_str("_h_"),
            _ => out.push(ch),
        }
    }
    out
}

/// Name of the unit function synthesized for a local module.
pub fn unit_name(key: &ModuleKey) -> String {
    format!("__unit_{}__", encode(key))
}

/// Name of the binding holding a module's evaluated result.
pub fn result_name(key: &ModuleKey) -> String {
    match key {
        ModuleKey::Local(_) => format!("__exports_{}__", encode(key)),
        ModuleKey::Library(_) => format!("__lib_{}__", encode(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path() {
        let key = ModuleKey::Local("/lib/my-utils.v2_final.mica".to_string());
        assert_eq!(
            encode(&key),
            "_s_lib_s_my_h_utils_d_v2_final_d_mica"
        );
    }

    #[test]
    fn test_encode_is_injective_on_separators() {
        let a = ModuleKey::Local("/a-b.mica".to_string());
        let b = ModuleKey::Local("/a/b.mica".to_string());
        assert_ne!(encode(&a), encode(&b));
    }

    #[test]
    fn test_unit_and_result_names() {
        let local = ModuleKey::Local("/a.mica".to_string());
        assert_eq!(unit_name(&local), "__unit__s_a_d_mica__");
        assert_eq!(result_name(&local), "__exports__s_a_d_mica__");

        let lib = ModuleKey::Library("strings".to_string());
        assert_eq!(result_name(&lib), "__lib_strings__");
    }
}
