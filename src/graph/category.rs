//! Category classification from an entity's path and declared category.

/// Path segments that override the declared category, in priority order.
const PATH_CATEGORIES: [(&str, &str); 5] = [
    ("/checklists/", "checklists"),
    ("/workflows/", "workflows"),
    ("/utils/", "utils"),
    ("/data/", "data"),
    ("/tools/", "tools"),
];

/// Sub-classify a script by where it lives. Expects a lower-cased path.
pub fn classify_script(path: &str) -> &'static str {
    if path.contains("/development/scripts/") {
        "scripts/task"
    } else if path.contains("/core/") {
        "scripts/engine"
    } else if path.contains("/infrastructure/") {
        "scripts/infra"
    } else {
        "scripts/task"
    }
}

/// Refine a declared category using the entity's path.
///
/// Pure and total: the same inputs always give the same label, and an empty
/// path simply yields `base_category`.
pub fn detect_category(base_category: &str, path: &str) -> String {
    let path = path.to_lowercase();

    if let Some((_, label)) = PATH_CATEGORIES
        .iter()
        .find(|(segment, _)| path.contains(segment))
    {
        return (*label).to_string();
    }

    if base_category == "scripts" || path.contains("/scripts/") {
        return classify_script(&path).to_string();
    }

    base_category.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_subcategories() {
        assert_eq!(
            detect_category("scripts", ".aios-core/development/scripts/x.js"),
            "scripts/task"
        );
        assert_eq!(detect_category("scripts", ".aios-core/core/x.js"), "scripts/engine");
        assert_eq!(
            detect_category("scripts", ".aios-core/infrastructure/deploy.sh"),
            "scripts/infra"
        );
        assert_eq!(detect_category("scripts", "misc/run.js"), "scripts/task");
    }

    #[test]
    fn test_path_segment_beats_declared_category() {
        assert_eq!(detect_category("other", ".aios-core/checklists/x.md"), "checklists");
        assert_eq!(detect_category("tasks", ".aios-core/workflows/flow.yaml"), "workflows");
        assert_eq!(detect_category("tasks", "a/Utils/helper.js"), "utils");
        assert_eq!(detect_category("tasks", "a/data/kb.md"), "data");
        assert_eq!(detect_category("tasks", "a/tools/t.md"), "tools");
    }

    #[test]
    fn test_priority_order_checklists_before_scripts() {
        assert_eq!(
            detect_category("scripts", "x/scripts/checklists/c.md"),
            "checklists"
        );
    }

    #[test]
    fn test_scripts_in_path_without_declared_scripts() {
        assert_eq!(detect_category("other", "pkg/scripts/core/run.js"), "scripts/engine");
    }

    #[test]
    fn test_empty_path_returns_base() {
        assert_eq!(detect_category("agents", ""), "agents");
        assert_eq!(detect_category("scripts", ""), "scripts/task");
    }
}
