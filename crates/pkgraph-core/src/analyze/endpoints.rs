//! HTTP endpoint extraction for the supported web frameworks.
//!
//! Extraction is regex-driven over raw source. Each framework extractor
//! yields the route method, the joined path, and the handler name when one
//! can be read off the registration site; handler names are then resolved
//! against the owning module's symbols.

use std::path::Path;

use regex::Regex;

use crate::lang::detect_language;
use crate::model::ids;
use crate::model::{Endpoint, HttpMethod, Symbol};

const NEST_CONTROLLER: &str = r#"@Controller\(["']([^"']+)["']\)"#;
const NEST_METHODS: &[(&str, &str)] = &[
    ("GET", r#"@Get\(["']([^"']*)["']\)|@Get\(\s*\)"#),
    ("POST", r#"@Post\(["']([^"']*)["']\)|@Post\(\s*\)"#),
    ("PUT", r#"@Put\(["']([^"']*)["']\)|@Put\(\s*\)"#),
    ("DELETE", r#"@Delete\(["']([^"']*)["']\)|@Delete\(\s*\)"#),
    ("PATCH", r#"@Patch\(["']([^"']*)["']\)|@Patch\(\s*\)"#),
];
const NEST_HANDLER: &str = r"(?m)^\s*(?:public\s+|private\s+|protected\s+)?(?:async\s+)?([A-Za-z_]\w*)\s*\(";

const EXPRESS_ROUTE: &str =
    r#"(?:app|router|express\(\))\.(get|post|put|delete|patch|all)\s*\(\s*["']([^"']+)["']"#;
const EXPRESS_HANDLER: &str =
    r"(?:function\s+(\w+)|const\s+(\w+)\s*=\s*(?:async\s*)?\(|(\w+)\s*:\s*(?:async\s*)?\()";

const SPRING_BASE: &str = r#"@RequestMapping\(["']([^"']+)["']\)"#;
const SPRING_METHODS: &[(&str, &str)] = &[
    ("GET", r#"@GetMapping\b(?:\(["']([^"']*)["']\))?"#),
    ("POST", r#"@PostMapping\b(?:\(["']([^"']*)["']\))?"#),
    ("PUT", r#"@PutMapping\b(?:\(["']([^"']*)["']\))?"#),
    ("DELETE", r#"@DeleteMapping\b(?:\(["']([^"']*)["']\))?"#),
    ("PATCH", r#"@PatchMapping\b(?:\(["']([^"']*)["']\))?"#),
];
const JAVA_METHOD_DEF: &str = r"(?:public|private|protected)\s+\w+\s+(\w+)\s*\(";

const ASPNET_BASE: &str = r#"\[Route\(["']([^"']+)["']\)\]"#;
const ASPNET_METHODS: &[(&str, &str)] = &[
    ("GET", r#"\[HttpGet(?:\(["']([^"']*)["']\))?\]"#),
    ("POST", r#"\[HttpPost(?:\(["']([^"']*)["']\))?\]"#),
    ("PUT", r#"\[HttpPut(?:\(["']([^"']*)["']\))?\]"#),
    ("DELETE", r#"\[HttpDelete(?:\(["']([^"']*)["']\))?\]"#),
    ("PATCH", r#"\[HttpPatch(?:\(["']([^"']*)["']\))?\]"#),
];

const FASTAPI_MARKER: &str = r"@(?:app|router)\.(?:get|post|put|delete|patch)";
const FASTAPI_PREFIX: &str = r#"APIRouter\(prefix=["']([^"']+)["']"#;
const FASTAPI_ROUTE: &str =
    r#"@(?:app|router)\.(get|post|put|delete|patch)\s*\(\s*["']([^"']+)["']"#;
const FASTAPI_HANDLER: &str = r"def\s+(\w+)\s*\(";

struct RawEndpoint {
    method: HttpMethod,
    path: String,
    handler: Option<String>,
}

/// Extracts endpoints for every framework applicable to this file.
///
/// Never fails: an unsupported language/framework combination yields an
/// empty list. Handler names are resolved to symbols of the owning module;
/// names that resolve nowhere leave `handler_symbol_id` as `None`.
pub fn extract_endpoints(
    path: &Path,
    source: &str,
    module_id: &str,
    frameworks: &[String],
    module_symbols: &[Symbol],
) -> Vec<Endpoint> {
    let Some(language) = detect_language(path) else {
        return Vec::new();
    };
    let has = |fw: &str| frameworks.iter().any(|f| f == fw);

    let mut raw: Vec<RawEndpoint> = Vec::new();
    if has("nestjs") && matches!(language, "typescript" | "javascript") {
        raw.extend(extract_nestjs(source));
    }
    if has("express") && matches!(language, "typescript" | "javascript") {
        raw.extend(extract_express(source));
    }
    if has("spring-boot") && language == "java" {
        raw.extend(extract_spring(source));
    }
    if frameworks.iter().any(|f| f.starts_with("aspnet")) && language == "csharp" {
        raw.extend(extract_aspnet(source));
    }
    if has("fastapi") && language == "python" {
        raw.extend(extract_fastapi(source));
    }

    raw.into_iter()
        .map(|r| {
            let handler_symbol_id = r
                .handler
                .as_deref()
                .and_then(|name| resolve_handler(name, module_symbols));
            Endpoint {
                id: ids::endpoint_id(r.method.as_str(), &r.path),
                method: r.method,
                path: r.path.clone(),
                handler_module_id: module_id.to_string(),
                handler_symbol_id,
                summary: format!("{} {}", r.method, r.path),
            }
        })
        .collect()
}

/// Maps a handler name to a symbol of the handler module: exact name match
/// first, then a `Class.handler` method match.
fn resolve_handler(name: &str, symbols: &[Symbol]) -> Option<String> {
    let suffix = format!(".{name}");
    symbols
        .iter()
        .find(|s| s.name == name)
        .or_else(|| symbols.iter().find(|s| s.name.ends_with(&suffix)))
        .map(|s| s.id.clone())
}

fn join_route(base: &str, suffix: &str) -> String {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    );
    format!("/{}", joined.trim_start_matches('/'))
}

/// Clamps a byte offset to a char boundary, rounding down.
fn floor_boundary(source: &str, offset: usize) -> usize {
    let mut i = offset.min(source.len());
    while i > 0 && !source.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn forward_window(source: &str, start: usize, len: usize) -> &str {
    let end = floor_boundary(source, start.saturating_add(len));
    &source[start..end]
}

fn rear_window(source: &str, end: usize, len: usize) -> &str {
    let start = floor_boundary(source, end.saturating_sub(len));
    &source[start..end]
}

fn extract_nestjs(source: &str) -> Vec<RawEndpoint> {
    let mut endpoints = Vec::new();

    let controller_re = match Regex::new(NEST_CONTROLLER) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };
    // A file without a class-level @Controller registers no routes.
    let Some(base) = controller_re
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
    else {
        return endpoints;
    };
    let handler_re = match Regex::new(NEST_HANDLER) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };

    for (verb, pattern) in NEST_METHODS {
        let re = match Regex::new(pattern) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let Some(method) = HttpMethod::parse(verb) else {
            continue;
        };
        for cap in re.captures_iter(source) {
            let full = match cap.get(0) {
                Some(m) => m,
                None => continue,
            };
            let suffix = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            // The handler is the next method definition after the decorator.
            let window = forward_window(source, full.end(), 500);
            let handler = handler_re
                .captures(window)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());

            endpoints.push(RawEndpoint {
                method,
                path: join_route(&base, suffix),
                handler,
            });
        }
    }

    endpoints
}

fn extract_express(source: &str) -> Vec<RawEndpoint> {
    let mut endpoints = Vec::new();

    let route_re = match Regex::new(EXPRESS_ROUTE) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };
    let handler_re = match Regex::new(EXPRESS_HANDLER) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };

    for cap in route_re.captures_iter(source) {
        let (Some(full), Some(verb), Some(path)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };
        let Some(method) = HttpMethod::parse(verb.as_str()) else {
            continue;
        };

        let window = forward_window(source, full.end(), 200);
        let handler = handler_re.captures(window).and_then(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .or_else(|| c.get(3))
                .map(|m| m.as_str().to_string())
        });

        endpoints.push(RawEndpoint {
            method,
            path: path.as_str().to_string(),
            handler,
        });
    }

    endpoints
}

/// Shared shape of the Spring and ASP.NET extractors: scan `public T name(`
/// definitions and look back for a routing annotation.
fn extract_annotated_methods(
    source: &str,
    base_pattern: &str,
    method_patterns: &[(&str, &str)],
    lookback: usize,
) -> Vec<RawEndpoint> {
    let mut endpoints = Vec::new();

    let base = Regex::new(base_pattern)
        .ok()
        .and_then(|re| re.captures(source).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
        .unwrap_or_default();

    let method_def_re = match Regex::new(JAVA_METHOD_DEF) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };
    let compiled: Vec<(HttpMethod, Regex)> = method_patterns
        .iter()
        .filter_map(|(verb, pattern)| {
            let method = HttpMethod::parse(verb)?;
            let re = Regex::new(pattern).ok()?;
            Some((method, re))
        })
        .collect();

    for def in method_def_re.captures_iter(source) {
        let (Some(full), Some(name)) = (def.get(0), def.get(1)) else {
            continue;
        };
        let context = rear_window(source, full.start(), lookback);

        for (method, re) in &compiled {
            let Some(cap) = re.captures(context) else {
                continue;
            };
            let suffix = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            endpoints.push(RawEndpoint {
                method: *method,
                path: join_route(&base, suffix),
                handler: Some(name.as_str().to_string()),
            });
            break;
        }
    }

    endpoints
}

fn extract_spring(source: &str) -> Vec<RawEndpoint> {
    extract_annotated_methods(source, SPRING_BASE, SPRING_METHODS, 300)
}

fn extract_aspnet(source: &str) -> Vec<RawEndpoint> {
    extract_annotated_methods(source, ASPNET_BASE, ASPNET_METHODS, 300)
}

fn extract_fastapi(source: &str) -> Vec<RawEndpoint> {
    let mut endpoints = Vec::new();

    let route_re = match Regex::new(FASTAPI_ROUTE) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };
    let handler_re = match Regex::new(FASTAPI_HANDLER) {
        Ok(r) => r,
        Err(_) => return endpoints,
    };

    // A router prefix only applies when route decorators exist at all.
    let has_routes = Regex::new(FASTAPI_MARKER)
        .map(|re| re.is_match(source))
        .unwrap_or(false);
    let base = if has_routes {
        Regex::new(FASTAPI_PREFIX)
            .ok()
            .and_then(|re| {
                re.captures(source)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .unwrap_or_default()
    } else {
        String::new()
    };

    for cap in route_re.captures_iter(source) {
        let (Some(full), Some(verb), Some(path)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };
        let Some(method) = HttpMethod::parse(verb.as_str()) else {
            continue;
        };

        let window = forward_window(source, full.end(), 200);
        let handler = handler_re
            .captures(window)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        endpoints.push(RawEndpoint {
            method,
            path: join_route(&base, path.as_str()),
            handler,
        });
    }

    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymbolKind;

    fn symbol(id: &str, name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            id: id.to_string(),
            module_id: "mod:src/users.controller.ts".to_string(),
            name: name.to_string(),
            kind,
            is_exported: true,
            signature: name.to_string(),
            visibility: "public".to_string(),
            is_async: None,
            decorators: None,
            parameters: None,
            return_type: None,
            summary: None,
        }
    }

    #[test]
    fn test_nestjs_controller_paths() {
        let source = r#"
@Controller('users')
export class UsersController {
    @Get(':id')
    findOne(@Param('id') id: string) {
        return this.service.findOne(id);
    }

    @Post('create')
    create(@Body() dto: CreateUserDto) {
        return this.service.create(dto);
    }
}
"#;
        let symbols = vec![
            symbol("sym:mod:src/users.controller.ts:UsersController", "UsersController", SymbolKind::Class),
            symbol("sym:mod:src/users.controller.ts:UsersController.findOne", "UsersController.findOne", SymbolKind::Method),
        ];
        let endpoints = extract_endpoints(
            Path::new("src/users.controller.ts"),
            source,
            "mod:src/users.controller.ts",
            &["nestjs".to_string()],
            &symbols,
        );

        assert_eq!(endpoints.len(), 2);
        let get = endpoints.iter().find(|e| e.method == HttpMethod::Get).unwrap();
        assert_eq!(get.id, "ep:GET:/users/:id");
        assert_eq!(get.path, "/users/:id");
        assert_eq!(
            get.handler_symbol_id.as_deref(),
            Some("sym:mod:src/users.controller.ts:UsersController.findOne")
        );
        let post = endpoints.iter().find(|e| e.method == HttpMethod::Post).unwrap();
        assert_eq!(post.path, "/users/create");
        // `create` never became a symbol, so the handler stays unresolved.
        assert_eq!(post.handler_symbol_id, None);
    }

    #[test]
    fn test_join_route() {
        assert_eq!(join_route("users", ":id"), "/users/:id");
        assert_eq!(join_route("/users/", "/:id"), "/users/:id");
        assert_eq!(join_route("", "health"), "/health");
        assert_eq!(join_route("users", ""), "/users/");
    }

    #[test]
    fn test_nestjs_without_controller_yields_nothing() {
        let source = "@Get('x')\nfindAll() {}\n";
        let endpoints = extract_endpoints(
            Path::new("src/users.ts"),
            source,
            "mod:src/users.ts",
            &["nestjs".to_string()],
            &[],
        );
        assert!(endpoints.is_empty());
    }

    #[test]
    fn test_express_routes() {
        let source = r#"
app.get('/health', function healthCheck(req, res) { res.send('ok'); });
router.post('/users', async (req, res) => { });
"#;
        let endpoints = extract_endpoints(
            Path::new("src/app.js"),
            source,
            "mod:src/app.js",
            &["express".to_string()],
            &[],
        );

        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].id, "ep:GET:/health");
        assert_eq!(endpoints[0].handler_symbol_id, None);
        assert_eq!(endpoints[1].id, "ep:POST:/users");
    }

    #[test]
    fn test_spring_endpoints() {
        let source = r#"
@RestController
@RequestMapping("/api/orders")
public class OrderController {
    @GetMapping("/open")
    public String listOpen() { return ""; }
}
"#;
        let endpoints = extract_endpoints(
            Path::new("OrderController.java"),
            source,
            "mod:OrderController.java",
            &["spring-boot".to_string()],
            &[],
        );
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].id, "ep:GET:/api/orders/open");
    }

    #[test]
    fn test_aspnet_attribute_without_path() {
        let source = r#"
[Route("api/items")]
public class ItemsController
{
    [HttpGet]
    public string GetAll() { return ""; }
}
"#;
        let endpoints = extract_endpoints(
            Path::new("ItemsController.cs"),
            source,
            "mod:ItemsController.cs",
            &["aspnet-core".to_string()],
            &[],
        );
        assert_eq!(endpoints.len(), 1);
        // An attribute without a path contributes an empty suffix.
        assert_eq!(endpoints[0].id, "ep:GET:/api/items/");
    }

    #[test]
    fn test_fastapi_router_prefix() {
        let source = r#"
router = APIRouter(prefix="/v1")

@router.get("/items")
async def list_items():
    return []
"#;
        let endpoints = extract_endpoints(
            Path::new("api/items.py"),
            source,
            "mod:api/items.py",
            &["fastapi".to_string()],
            &[],
        );
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].id, "ep:GET:/v1/items");
        assert_eq!(endpoints[0].summary, "GET /v1/items");
    }

    #[test]
    fn test_unsupported_language_is_empty() {
        let endpoints = extract_endpoints(
            Path::new("main.rs"),
            "fn main() {}",
            "mod:main.rs",
            &["express".to_string()],
            &[],
        );
        assert!(endpoints.is_empty());
    }
}
