//! Content-addressed identifiers for graph entities.
//!
//! Every entity id is a prefixed, human-readable string derived from stable
//! inputs (repo-relative paths, qualified names, routes), so regenerating the
//! same tree yields the same ids.

/// Prefix for module ids.
pub const MODULE_PREFIX: &str = "mod:";
/// Prefix for symbol ids.
pub const SYMBOL_PREFIX: &str = "sym:";
/// Prefix for endpoint ids.
pub const ENDPOINT_PREFIX: &str = "ep:";
/// Prefix for feature ids.
pub const FEATURE_PREFIX: &str = "feat:";

/// Normalize a repo-relative path to forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Module id for a repo-relative file path: `mod:src/app/user.service.ts`.
pub fn module_id(rel_path: &str) -> String {
    format!("{}{}", MODULE_PREFIX, normalize_path(rel_path))
}

/// Symbol id within a module: `sym:mod:src/a.py:UserService.find_one`.
///
/// Methods use `Class.method` as their qualified name.
pub fn symbol_id(module_id: &str, qualified_name: &str) -> String {
    format!("{}{}:{}", SYMBOL_PREFIX, module_id, qualified_name)
}

/// Endpoint id: `ep:GET:/users/:id`. The method is uppercased.
pub fn endpoint_id(method: &str, path: &str) -> String {
    format!("{}{}:{}", ENDPOINT_PREFIX, method.to_uppercase(), path)
}

/// Feature id for a repo-relative folder path: `feat:src/app`.
pub fn feature_id(folder: &str) -> String {
    format!("{}{}", FEATURE_PREFIX, normalize_path(folder))
}

/// Owning module id of a symbol id.
///
/// `sym:mod:src/a.py:Svc.find` resolves to `mod:src/a.py`. The module path
/// may itself contain colons only through the `mod:` prefix, so the owner is
/// everything between `sym:` and the final `:`.
pub fn module_of_symbol(symbol_id: &str) -> Option<&str> {
    let rest = symbol_id.strip_prefix(SYMBOL_PREFIX)?;
    let cut = rest.rfind(':')?;
    let module = &rest[..cut];
    if module.starts_with(MODULE_PREFIX) && module.len() > MODULE_PREFIX.len() {
        Some(module)
    } else {
        None
    }
}

/// Qualified name portion of a symbol id.
pub fn symbol_name(symbol_id: &str) -> Option<&str> {
    let rest = symbol_id.strip_prefix(SYMBOL_PREFIX)?;
    let cut = rest.rfind(':')?;
    let name = &rest[cut + 1..];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Entity class encoded in an id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Module,
    Symbol,
    Endpoint,
    Feature,
}

/// Classify an id by its prefix.
pub fn id_kind(id: &str) -> Option<IdKind> {
    if id.starts_with(MODULE_PREFIX) {
        Some(IdKind::Module)
    } else if id.starts_with(SYMBOL_PREFIX) {
        Some(IdKind::Symbol)
    } else if id.starts_with(ENDPOINT_PREFIX) {
        Some(IdKind::Endpoint)
    } else if id.starts_with(FEATURE_PREFIX) {
        Some(IdKind::Feature)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_uses_forward_slashes() {
        assert_eq!(module_id("src\\app\\main.py"), "mod:src/app/main.py");
        assert_eq!(module_id("src/app/main.py"), "mod:src/app/main.py");
    }

    #[test]
    fn test_symbol_id_round_trip() {
        let mid = module_id("src/a.py");
        let sid = symbol_id(&mid, "UserService.find_one");
        assert_eq!(sid, "sym:mod:src/a.py:UserService.find_one");
        assert_eq!(module_of_symbol(&sid), Some("mod:src/a.py"));
        assert_eq!(symbol_name(&sid), Some("UserService.find_one"));
    }

    #[test]
    fn test_module_of_symbol_rejects_malformed() {
        assert_eq!(module_of_symbol("sym:garbage"), None);
        assert_eq!(module_of_symbol("mod:src/a.py"), None);
        assert_eq!(module_of_symbol("sym:mod:"), None);
    }

    #[test]
    fn test_endpoint_id_uppercases_method() {
        assert_eq!(endpoint_id("get", "/users/:id"), "ep:GET:/users/:id");
    }

    #[test]
    fn test_id_kind_classification() {
        assert_eq!(id_kind("mod:src/a.py"), Some(IdKind::Module));
        assert_eq!(id_kind("sym:mod:src/a.py:f"), Some(IdKind::Symbol));
        assert_eq!(id_kind("ep:GET:/x"), Some(IdKind::Endpoint));
        assert_eq!(id_kind("feat:src"), Some(IdKind::Feature));
        assert_eq!(id_kind("something"), None);
    }
}
