//! Framework detection at project and module level.
//!
//! Detection runs in two phases: a manifest scan over package manager files
//! (`package.json`, `requirements.txt`, `pom.xml`, `build.gradle`,
//! `*.csproj`, `web.config`) and a static-analysis fallback that greps
//! common source trees for framework markers.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use ignore::WalkBuilder;
use regex::Regex;

use crate::lang::SourceOutline;

/// Framework marker patterns searched case-insensitively in source files.
const FRAMEWORK_PATTERNS: &[(&str, &[&str])] = &[
    (
        "nestjs",
        &[r"@nestjs/", r"@Controller\(", r"@Injectable\(", r"@Module\("],
    ),
    (
        "express",
        &[
            r#"require\(['"]express['"]\)"#,
            r#"from ['"]express['"]"#,
            r"app\.(get|post|put|delete|use)\(",
            r"router\.(get|post|put|delete)\(",
        ],
    ),
    (
        "fastapi",
        &[
            r"from fastapi import",
            r"@app\.(get|post|put|delete)\(",
            r"@router\.(get|post|put|delete)\(",
        ],
    ),
    (
        "flask",
        &[r"from flask import", r"@app\.route\(", r"Flask\(", r"flask\."],
    ),
    (
        "spring-boot",
        &[
            r"@RestController",
            r"@Controller",
            r"@Service",
            r"@Repository",
            r"@SpringBootApplication",
            r"import org\.springframework",
        ],
    ),
    (
        "aspnet-core",
        &[
            r"\[Route\(",
            r"\[HttpGet\]",
            r"\[HttpPost\]",
            r"using Microsoft\.AspNetCore",
        ],
    ),
    (
        "react",
        &[
            r#"import.*from ['"]react['"]"#,
            r"React\.(createElement|Component)",
        ],
    ),
    (
        "angular",
        &[r"@Component\(", r"@Injectable\(", r"import.*@angular/"],
    ),
    (
        "vue",
        &[
            r#"import.*from ['"]vue['"]"#,
            r"Vue\.(component|directive)",
        ],
    ),
];

const STATIC_SCAN_DIRS: &[&str] = &[
    "src", "lib", "app", "server", "client", "backend", "frontend",
];

/// Vendored checkouts are never evidence of the host project's stack.
fn is_excluded(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rel| rel.components().any(|c| c.as_os_str() == "cloned_repos"))
        .unwrap_or(false)
}

fn read_text(path: &Path) -> Option<String> {
    fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Detects the project's frameworks from manifests and source markers.
///
/// The result is sorted and de-duplicated; Python frameworks declared in the
/// root `requirements.txt` are ordered first.
pub fn detect_frameworks(root: &Path) -> Vec<String> {
    let mut frameworks: BTreeSet<String> = BTreeSet::new();

    detect_from_manifests(root, &mut frameworks);
    detect_from_static_analysis(root, &mut frameworks);

    let root_python = root_python_frameworks(root);
    let mut ordered: Vec<String> = Vec::new();
    for fw in &root_python {
        if frameworks.contains(fw) {
            ordered.push(fw.clone());
        }
    }
    for fw in frameworks {
        if !ordered.contains(&fw) {
            ordered.push(fw);
        }
    }
    ordered
}

fn root_python_frameworks(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(content) = read_text(&root.join("requirements.txt")) {
        let lower = content.to_lowercase();
        for fw in ["fastapi", "flask", "django"] {
            if lower.contains(fw) {
                found.push(fw.to_string());
            }
        }
    }
    found.sort();
    found
}

fn detect_from_manifests(root: &Path, frameworks: &mut BTreeSet<String>) {
    if let Some(content) = read_text(&root.join("package.json")) {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) {
            let mut deps: BTreeSet<String> = BTreeSet::new();
            for key in ["dependencies", "devDependencies"] {
                if let Some(map) = json.get(key).and_then(|v| v.as_object()) {
                    deps.extend(map.keys().cloned());
                }
            }
            let has = |name: &str| deps.contains(name);
            if has("@nestjs/core") || has("@nestjs/common") {
                frameworks.insert("nestjs".to_string());
            }
            if has("express") {
                frameworks.insert("express".to_string());
            }
            if has("fastify") {
                frameworks.insert("fastify".to_string());
            }
            if has("koa") {
                frameworks.insert("koa".to_string());
            }
            if has("react") {
                frameworks.insert("react".to_string());
            }
            if has("@angular/core") {
                frameworks.insert("angular".to_string());
            }
            if has("vue") || has("@vue/core") {
                frameworks.insert("vue".to_string());
            }
            if has("next") {
                frameworks.insert("nextjs".to_string());
            }
        }
    }

    if let Some(content) = read_text(&root.join("requirements.txt")) {
        let lower = content.to_lowercase();
        for fw in ["fastapi", "flask", "django"] {
            if lower.contains(fw) {
                frameworks.insert(fw.to_string());
            }
        }
    }

    if let Some(content) = read_text(&root.join("pom.xml")) {
        if content.contains("spring-boot") || content.contains("springframework") {
            frameworks.insert("spring-boot".to_string());
        }
        if content.contains("spring-web") {
            frameworks.insert("spring-mvc".to_string());
        }
    }

    if let Some(content) = read_text(&root.join("build.gradle")) {
        if content.contains("spring-boot") || content.contains("org.springframework") {
            frameworks.insert("spring-boot".to_string());
        }
    }

    for entry in WalkBuilder::new(root).hidden(true).build().flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csproj")
            || is_excluded(path, root)
        {
            continue;
        }
        if let Some(content) = read_text(path) {
            if content.contains("Microsoft.AspNetCore") {
                frameworks.insert("aspnet-core".to_string());
            }
            if content.contains("Microsoft.AspNetCore.Mvc") {
                frameworks.insert("aspnet-mvc".to_string());
            }
            if content.contains("Microsoft.AspNetCore.WebApi") {
                frameworks.insert("aspnet-webapi".to_string());
            }
        }
    }

    if root.join("web.config").exists() {
        frameworks.insert("aspnet-classic".to_string());
    }
}

fn detect_from_static_analysis(root: &Path, frameworks: &mut BTreeSet<String>) {
    let compiled: Vec<(&str, Vec<Regex>)> = FRAMEWORK_PATTERNS
        .iter()
        .map(|(fw, patterns)| {
            let regexes = patterns
                .iter()
                .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
                .collect();
            (*fw, regexes)
        })
        .collect();

    for dir in STATIC_SCAN_DIRS {
        let scan_root = root.join(dir);
        if !scan_root.is_dir() || is_excluded(&scan_root, root) {
            continue;
        }

        for entry in WalkBuilder::new(&scan_root).build().flatten() {
            let path = entry.path();
            if !path.is_file() || is_excluded(path, root) {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let applies = |framework: &str| match ext {
                "ts" | "js" | "tsx" | "jsx" => true,
                "py" => framework == "fastapi" || framework == "flask",
                "java" => framework.starts_with("spring"),
                "cs" => framework.starts_with("aspnet"),
                _ => false,
            };
            if !applies("nestjs") && !applies("fastapi") && !applies("spring-boot") && !applies("aspnet-core") {
                continue;
            }
            let Some(content) = read_text(path) else {
                continue;
            };
            for (framework, regexes) in &compiled {
                if !applies(framework) || frameworks.contains(*framework) {
                    continue;
                }
                if regexes.iter().any(|re| re.is_match(&content)) {
                    frameworks.insert(framework.to_string());
                }
            }
        }
    }
}

/// Attributes a framework to a single module.
///
/// Strong in-file evidence (decorators, imports, calls) yields confidence
/// 0.9; a filename convention matching one of the project's frameworks
/// yields 0.6; anything else yields no attribution.
pub fn detect_module_framework(
    path: &Path,
    outline: &SourceOutline,
    project_frameworks: &[String],
) -> (Option<String>, Option<f64>) {
    let decorators: Vec<String> = outline
        .all_decorators()
        .map(|d| d.to_lowercase())
        .collect();
    let decorators_str = decorators.join(" ");
    let imports_str = outline.imports.join(" ").to_lowercase();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if decorators_str.contains("@controller")
        || decorators_str.contains("@injectable")
        || decorators_str.contains("@module")
    {
        return (Some("nestjs".to_string()), Some(0.9));
    }
    if decorators_str.contains("@app.route")
        || decorators_str.contains("blueprint")
        || outline.calls.iter().any(|c| c.callee == "Flask")
        || imports_str.contains("from flask")
    {
        return (Some("flask".to_string()), Some(0.9));
    }
    if imports_str.contains("from fastapi")
        || ["get", "post", "put", "delete", "patch"].iter().any(|verb| {
            decorators_str.contains(&format!("@app.{verb}"))
                || decorators_str.contains(&format!("@router.{verb}"))
        })
    {
        return (Some("fastapi".to_string()), Some(0.9));
    }
    if decorators_str.contains("@restcontroller")
        || decorators_str.contains("@service")
        || decorators_str.contains("@repository")
        || decorators_str.contains("@springbootapplication")
        || imports_str.contains("org.springframework")
    {
        return (Some("spring-boot".to_string()), Some(0.9));
    }
    if decorators_str.contains("[route(") || decorators_str.contains("[http") {
        let name = project_frameworks
            .iter()
            .find(|f| f.starts_with("aspnet"))
            .cloned()
            .unwrap_or_else(|| "aspnet-core".to_string());
        return (Some(name), Some(0.9));
    }
    if imports_str.contains("'react'") || imports_str.contains("\"react\"") {
        return (Some("react".to_string()), Some(0.9));
    }

    let has = |fw: &str| project_frameworks.iter().any(|f| f == fw);
    if (file_name.ends_with(".controller.ts")
        || file_name.ends_with(".service.ts")
        || file_name.ends_with(".module.ts"))
        && has("nestjs")
    {
        return (Some("nestjs".to_string()), Some(0.6));
    }
    if (file_name == "views.py" || file_name == "models.py" || file_name == "urls.py")
        && has("django")
    {
        return (Some("django".to_string()), Some(0.6));
    }
    if ext == "java" && file_name.contains("controller") && has("spring-boot") {
        return (Some("spring-boot".to_string()), Some(0.6));
    }
    if ext == "cs" && file_name.contains("controller") {
        if let Some(fw) = project_frameworks.iter().find(|f| f.starts_with("aspnet")) {
            return (Some(fw.clone()), Some(0.6));
        }
    }
    if (ext == "tsx" || ext == "jsx") && has("react") {
        return (Some("react".to_string()), Some(0.6));
    }

    (None, None)
}

/// Tags a module with structural kinds (`controller`, `service`, ...)
/// derived from framework conventions plus generic filename patterns.
pub fn detect_module_kind(
    path: &Path,
    outline: &SourceOutline,
    frameworks: &[String],
) -> Vec<String> {
    let mut kinds: Vec<String> = Vec::new();
    let mut push = |kinds: &mut Vec<String>, kind: &str| {
        if !kinds.iter().any(|k| k == kind) {
            kinds.push(kind.to_string());
        }
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    let path_lower = path.to_string_lossy().to_lowercase();
    let decorators_str = outline
        .all_decorators()
        .map(|d| d.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let has = |fw: &str| frameworks.iter().any(|f| f == fw);

    if has("nestjs") {
        if file_name.contains("controller") || decorators_str.contains("controller") {
            push(&mut kinds, "controller");
        }
        if file_name.contains("service") || decorators_str.contains("injectable") {
            push(&mut kinds, "service");
        }
        if file_name.contains("module") || decorators_str.contains("@module") {
            push(&mut kinds, "module");
        }
    }

    if has("spring-boot") {
        if file_name.contains("controller") || decorators_str.contains("restcontroller") {
            push(&mut kinds, "controller");
        }
        if file_name.contains("service") || decorators_str.contains("service") {
            push(&mut kinds, "service");
        }
        if file_name.contains("repository") || decorators_str.contains("repository") {
            push(&mut kinds, "repository");
        }
    }

    if frameworks.iter().any(|f| f.starts_with("aspnet"))
        && (file_name.contains("controller") || decorators_str.contains("controller"))
    {
        push(&mut kinds, "controller");
    }

    if has("django") {
        if path_lower.contains("views") || file_name.contains("view") {
            push(&mut kinds, "controller");
        }
        if path_lower.contains("models") || file_name.contains("model") {
            push(&mut kinds, "entity");
        }
        if file_name.contains("urls") {
            push(&mut kinds, "route");
        }
    }

    if has("flask")
        && (decorators_str.contains("@app.route") || decorators_str.contains("blueprint"))
    {
        push(&mut kinds, "controller");
    }

    if has("rails") {
        if file_name.contains("controller") {
            push(&mut kinds, "controller");
        }
        if file_name.contains("model") {
            push(&mut kinds, "entity");
        }
        if file_name.contains("helper") {
            push(&mut kinds, "util");
        }
    }

    if has("react") && (file_name.contains("component") || path_lower.contains("jsx")) {
        push(&mut kinds, "component");
    }

    if has("vue") && (file_name.contains("component") || path_lower.contains("vue")) {
        push(&mut kinds, "component");
    }

    if file_name.contains("test") || file_name.contains("spec") {
        push(&mut kinds, "test");
    }
    if file_name.contains("util") || file_name.contains("helper") {
        push(&mut kinds, "util");
    }
    if file_name.contains("entity") || file_name.contains("model") {
        push(&mut kinds, "entity");
    }
    if file_name.contains("component") {
        push(&mut kinds, "component");
    }

    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{ClassDef, FunctionDef};
    use std::fs;
    use tempfile::TempDir;

    fn outline_with_class_decorator(decorator: &str) -> SourceOutline {
        let mut outline = SourceOutline::default();
        let mut class = ClassDef::named("UsersController");
        class.decorators.push(decorator.to_string());
        outline.classes.push(class);
        outline
    }

    #[test]
    fn test_manifest_detection_from_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"@nestjs/core": "^10.0.0", "express": "^4.18.0"}}"#,
        )
        .unwrap();

        let frameworks = detect_frameworks(dir.path());
        assert!(frameworks.contains(&"nestjs".to_string()));
        assert!(frameworks.contains(&"express".to_string()));
    }

    #[test]
    fn test_static_detection_in_src_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("main.py"),
            "from flask import Flask\napp = Flask(__name__)\n",
        )
        .unwrap();

        let frameworks = detect_frameworks(dir.path());
        assert_eq!(frameworks, vec!["flask"]);
    }

    #[test]
    fn test_root_requirements_ordered_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask==3.0.0\n").unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"express": "^4.18.0"}}"#,
        )
        .unwrap();

        let frameworks = detect_frameworks(dir.path());
        assert_eq!(frameworks[0], "flask");
        assert!(frameworks.contains(&"express".to_string()));
    }

    #[test]
    fn test_cloned_repos_excluded() {
        let dir = TempDir::new().unwrap();
        let vendored = dir.path().join("cloned_repos").join("other");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(
            vendored.join("App.csproj"),
            "<PackageReference Include=\"Microsoft.AspNetCore.Mvc\" />",
        )
        .unwrap();

        let frameworks = detect_frameworks(dir.path());
        assert!(frameworks.is_empty());
    }

    #[test]
    fn test_module_framework_decorator_evidence() {
        let outline = outline_with_class_decorator("@Controller('users')");
        let (fw, confidence) = detect_module_framework(
            Path::new("src/users.controller.ts"),
            &outline,
            &["nestjs".to_string()],
        );
        assert_eq!(fw.as_deref(), Some("nestjs"));
        assert_eq!(confidence, Some(0.9));
    }

    #[test]
    fn test_module_framework_filename_fallback() {
        let outline = SourceOutline::default();
        let (fw, confidence) = detect_module_framework(
            Path::new("src/users.service.ts"),
            &outline,
            &["nestjs".to_string()],
        );
        assert_eq!(fw.as_deref(), Some("nestjs"));
        assert_eq!(confidence, Some(0.6));

        let (none_fw, none_conf) =
            detect_module_framework(Path::new("src/util.ts"), &outline, &[]);
        assert_eq!(none_fw, None);
        assert_eq!(none_conf, None);
    }

    #[test]
    fn test_module_kinds() {
        let outline = outline_with_class_decorator("@Controller('users')");
        let kinds = detect_module_kind(
            Path::new("src/users.controller.ts"),
            &outline,
            &["nestjs".to_string()],
        );
        assert_eq!(kinds, vec!["controller"]);

        let plain = SourceOutline::default();
        let kinds = detect_module_kind(Path::new("src/date-util.ts"), &plain, &[]);
        assert_eq!(kinds, vec!["util"]);

        let mut spec_outline = SourceOutline::default();
        spec_outline.functions.push(FunctionDef::named("it"));
        let kinds = detect_module_kind(Path::new("src/users.spec.ts"), &spec_outline, &[]);
        assert_eq!(kinds, vec!["test"]);
    }
}
