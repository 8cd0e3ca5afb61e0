//! Symbol records built from parsed outlines.
//!
//! Symbols are built twice per run: once before endpoint extraction so
//! handlers can be resolved, and once after fan statistics exist so heavily
//! imported classes get their docstring summary attached. Each call resets
//! the owning module's export list before refilling it.

use std::collections::HashMap;

use crate::analyze::FanStats;
use crate::lang::{ClassDef, FunctionDef, InterfaceDef, SourceOutline};
use crate::model::{ids, Module, Symbol, SymbolKind};

/// Builds symbols for every module with an outline, in module order.
///
/// Per module the order is functions, then each class followed by its
/// methods, then interfaces. Top-level definitions are appended to the
/// module's `exports`; methods are not. Class summaries are only attached
/// when `fan` is present and the module's fan-in reaches `fan_threshold`.
pub fn build_symbols(
    modules: &mut [Module],
    outlines: &HashMap<String, SourceOutline>,
    fan: Option<&FanStats>,
    fan_threshold: u32,
) -> Vec<Symbol> {
    let mut symbols = Vec::new();

    for module in modules.iter_mut() {
        module.exports.clear();
        let Some(outline) = outlines.get(&module.id) else {
            continue;
        };
        let include_class_summary =
            fan.is_some_and(|stats| stats.fan_in(&module.id) >= fan_threshold);

        for func in &outline.functions {
            let symbol = function_symbol(&module.id, func);
            module.exports.push(symbol.id.clone());
            symbols.push(symbol);
        }
        for class in &outline.classes {
            let symbol = class_symbol(&module.id, class, include_class_summary);
            module.exports.push(symbol.id.clone());
            symbols.push(symbol);
            for method in &class.methods {
                symbols.push(method_symbol(&module.id, &class.name, method));
            }
        }
        for interface in &outline.interfaces {
            let symbol = interface_symbol(&module.id, interface);
            module.exports.push(symbol.id.clone());
            symbols.push(symbol);
        }
    }

    symbols
}

fn function_symbol(module_id: &str, func: &FunctionDef) -> Symbol {
    Symbol {
        id: ids::symbol_id(module_id, &func.name),
        module_id: module_id.to_string(),
        name: func.name.clone(),
        kind: SymbolKind::Function,
        is_exported: func.is_exported,
        signature: func.signature(),
        visibility: "public".to_string(),
        is_async: func.is_async.then_some(true),
        decorators: non_empty(&func.decorators),
        parameters: non_empty(&func.parameters),
        return_type: func.return_type.clone().filter(|r| !r.is_empty()),
        summary: func.docstring.clone(),
    }
}

fn class_symbol(module_id: &str, class: &ClassDef, include_summary: bool) -> Symbol {
    Symbol {
        id: ids::symbol_id(module_id, &class.name),
        module_id: module_id.to_string(),
        name: class.name.clone(),
        kind: SymbolKind::Class,
        is_exported: true,
        signature: class.name.clone(),
        visibility: "public".to_string(),
        is_async: None,
        decorators: non_empty(&class.decorators),
        parameters: None,
        return_type: None,
        summary: if include_summary {
            class.docstring.clone()
        } else {
            None
        },
    }
}

fn method_symbol(module_id: &str, class_name: &str, method: &FunctionDef) -> Symbol {
    let name = format!("{}.{}", class_name, method.name);
    Symbol {
        id: ids::symbol_id(module_id, &name),
        module_id: module_id.to_string(),
        name,
        kind: SymbolKind::Method,
        is_exported: method.is_exported,
        signature: method.signature(),
        visibility: "public".to_string(),
        is_async: method.is_async.then_some(true),
        decorators: non_empty(&method.decorators),
        parameters: non_empty(&method.parameters),
        return_type: method.return_type.clone().filter(|r| !r.is_empty()),
        summary: method.docstring.clone(),
    }
}

fn interface_symbol(module_id: &str, interface: &InterfaceDef) -> Symbol {
    Symbol {
        id: ids::symbol_id(module_id, &interface.name),
        module_id: module_id.to_string(),
        name: interface.name.clone(),
        kind: SymbolKind::Interface,
        is_exported: true,
        signature: interface.name.clone(),
        visibility: "public".to_string(),
        is_async: None,
        decorators: None,
        parameters: None,
        return_type: None,
        summary: None,
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}
