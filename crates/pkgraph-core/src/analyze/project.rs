//! Repository-level metadata: languages, build tools, git state, package
//! facts from whichever manifests are present.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use ignore::WalkBuilder;
use regex::Regex;
use serde_json::{Map, Value};

use crate::lang::detect_language;
use crate::model::ProjectInfo;

const MAVEN_GROUP_ID: &str = r"<groupId>([^<]+)</groupId>";
const MAVEN_ARTIFACT_ID: &str = r"<artifactId>([^<]+)</artifactId>";
const CSPROJ_ASSEMBLY_NAME: &str = r"(?s)<PropertyGroup>.*?<AssemblyName>([^<]+)</AssemblyName>";

/// Gathers project facts from the repo root and the walked file set.
///
/// `frameworks` comes from the caller so framework detection runs once per
/// generation rather than once per consumer.
pub fn extract_project_info(
    root: &Path,
    files: &BTreeSet<String>,
    frameworks: Vec<String>,
) -> ProjectInfo {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    ProjectInfo {
        id: name.clone(),
        name,
        root_path: root.display().to_string(),
        languages: detect_languages(files),
        frameworks,
        build_tools: detect_build_tools(root),
        git_sha: git_sha(root),
        metadata: package_metadata(root),
    }
}

/// Sorted de-duplicated language names over the walked files.
pub fn detect_languages(files: &BTreeSet<String>) -> Vec<String> {
    let langs: BTreeSet<&str> = files
        .iter()
        .filter_map(|f| detect_language(Path::new(f)))
        .collect();
    langs.into_iter().map(|l| l.to_string()).collect()
}

/// Build tooling inferred from well-known manifest files at the root.
pub fn detect_build_tools(root: &Path) -> Vec<String> {
    let mut tools = Vec::new();

    if root.join("package.json").is_file() {
        tools.push("npm".to_string());
        if root.join("yarn.lock").is_file() {
            tools.push("yarn".to_string());
        }
        if root.join("pnpm-lock.yaml").is_file() {
            tools.push("pnpm".to_string());
        }
    }
    if root.join("pom.xml").is_file() {
        tools.push("maven".to_string());
    }
    if root.join("build.gradle").is_file() || root.join("build.gradle.kts").is_file() {
        tools.push("gradle".to_string());
    }
    if !find_csproj_files(root).is_empty() {
        tools.push("dotnet".to_string());
    }
    if root.join("CMakeLists.txt").is_file() {
        tools.push("cmake".to_string());
    }
    if root.join("Makefile").is_file() {
        tools.push("make".to_string());
    }

    tools
}

/// HEAD commit sha, or None when git is absent or the root is not a repo.
pub fn git_sha(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() {
        None
    } else {
        Some(sha)
    }
}

/// Package-manager facts pulled from manifests, keyed for the
/// `project.metadata` map.
fn package_metadata(root: &Path) -> Map<String, Value> {
    let mut metadata = Map::new();

    if let Ok(content) = std::fs::read_to_string(root.join("package.json")) {
        if let Ok(pkg) = serde_json::from_str::<Value>(&content) {
            metadata.insert("packageManager".to_string(), Value::from("npm"));
            if let Some(name) = pkg.get("name").and_then(|v| v.as_str()) {
                metadata.insert("packageName".to_string(), Value::from(name));
            }
            if let Some(version) = pkg.get("version").and_then(|v| v.as_str()) {
                metadata.insert("packageVersion".to_string(), Value::from(version));
            }
        }
    }

    if let Ok(content) = std::fs::read_to_string(root.join("pom.xml")) {
        let group = capture_first(MAVEN_GROUP_ID, &content);
        let artifact = capture_first(MAVEN_ARTIFACT_ID, &content);
        if let (Some(group), Some(artifact)) = (group, artifact) {
            metadata.insert("mavenGroupId".to_string(), Value::from(group));
            metadata.insert("mavenArtifactId".to_string(), Value::from(artifact));
        }
    }

    let csprojs = find_csproj_files(root);
    if let Some(first) = csprojs.first() {
        if let Ok(content) = std::fs::read_to_string(first) {
            if let Some(name) = capture_first(CSPROJ_ASSEMBLY_NAME, &content) {
                metadata.insert("dotnetAssemblyName".to_string(), Value::from(name));
            }
        }
    }

    metadata
}

fn capture_first(pattern: &str, haystack: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// All `.csproj` files under the root, sorted for determinism.
fn find_csproj_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkBuilder::new(root).hidden(true).build().flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "csproj") {
            found.push(path.to_path_buf());
        }
    }
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_languages_sorted_unique() {
        let files: BTreeSet<String> = [
            "src/app.ts",
            "src/util.ts",
            "scripts/run.py",
            "native/lib.c",
            "README.md",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(detect_languages(&files), vec!["c", "python", "typescript"]);
    }

    #[test]
    fn test_build_tools_from_manifests() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        fs::write(dir.path().join("Makefile"), "all:\n").unwrap();

        let tools = detect_build_tools(dir.path());
        assert_eq!(tools, vec!["npm", "yarn", "make"]);
    }

    #[test]
    fn test_package_json_metadata() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "shop-api", "version": "2.1.0"}"#,
        )
        .unwrap();

        let info = extract_project_info(dir.path(), &BTreeSet::new(), Vec::new());
        assert_eq!(
            info.metadata.get("packageName").and_then(|v| v.as_str()),
            Some("shop-api")
        );
        assert_eq!(
            info.metadata.get("packageVersion").and_then(|v| v.as_str()),
            Some("2.1.0")
        );
        assert_eq!(
            info.metadata.get("packageManager").and_then(|v| v.as_str()),
            Some("npm")
        );
    }

    #[test]
    fn test_maven_coordinates_require_both_tags() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pom.xml"),
            "<project><groupId>com.acme</groupId></project>",
        )
        .unwrap();

        let info = extract_project_info(dir.path(), &BTreeSet::new(), Vec::new());
        assert!(!info.metadata.contains_key("mavenGroupId"));

        fs::write(
            dir.path().join("pom.xml"),
            "<project><groupId>com.acme</groupId><artifactId>shop</artifactId></project>",
        )
        .unwrap();
        let info = extract_project_info(dir.path(), &BTreeSet::new(), Vec::new());
        assert_eq!(
            info.metadata.get("mavenGroupId").and_then(|v| v.as_str()),
            Some("com.acme")
        );
        assert_eq!(
            info.metadata.get("mavenArtifactId").and_then(|v| v.as_str()),
            Some("shop")
        );
    }

    #[test]
    fn test_git_sha_none_outside_repo() {
        let dir = TempDir::new().unwrap();
        assert_eq!(git_sha(dir.path()), None);
    }

    #[test]
    fn test_project_name_from_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("shop-api");
        fs::create_dir(&root).unwrap();

        let info = extract_project_info(&root, &BTreeSet::new(), vec!["nestjs".to_string()]);
        assert_eq!(info.id, "shop-api");
        assert_eq!(info.name, "shop-api");
        assert_eq!(info.frameworks, vec!["nestjs"]);
    }
}
