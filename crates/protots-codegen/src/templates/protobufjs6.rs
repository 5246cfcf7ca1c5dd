//! The `protobufjs6` template: message and enum declarations for use with
//! the protobufjs 6.x reflection API.
//!
//! Emits one top-level `protobufjs6.d.ts` exposing every message as a
//! `TypedType<T>` member of a nested interface, plus one `index.d.ts` per
//! namespace that owns a message or enum somewhere in its subtree.

use std::fmt::Write;

use protots_model::{NodeId, Root};

use crate::paths::{
    child_enums, child_namespaces, child_types, has_type_or_enum, namespaces_transitive,
    output_file_path,
};
use crate::resolve::{namespace_import_declarations, namespaced_type_reference};
use crate::templates::{banner, field_ts_type};
use crate::{CodegenError, Template};

const TEMPLATE_NAME: &str = "protobufjs6";

pub struct ProtobufJs6Template;

impl Template for ProtobufJs6Template {
    fn name(&self) -> &'static str {
        TEMPLATE_NAME
    }

    fn render(&self, root: &Root) -> Result<Vec<(String, String)>, CodegenError> {
        let mut files = vec![("protobufjs6.d.ts".to_string(), top_level_file(root))];
        for ns in namespaces_transitive(root, root.root()) {
            if ns == root.root() || !has_type_or_enum(root, ns) {
                continue;
            }
            files.push((
                output_file_path(root, ns, "index.d.ts"),
                namespace_file(root, ns)?,
            ));
        }
        Ok(files)
    }
}

/// The root `protobufjs6.d.ts`: mirrors the package hierarchy as a nested
/// interface where every message appears as a `_Message: TypedType<T>`
/// member, so `root.lookupType(...)` results can be typed.
fn top_level_file(root: &Root) -> String {
    let mut out = banner(TEMPLATE_NAME);
    out.push_str(
        "import { Message, Type, Constructor, Writer, Reader, IConversionOptions } from 'protobufjs';\n",
    );
    for import in namespace_import_declarations(root, root.root()) {
        out.push_str(&import);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(
        "/** Extend the protobufjs base type 'Type' to include a generic type parameter 'T', to help type inference. */\n",
    );
    out.push_str("export interface TypedType<T extends object> extends Type {\n}\n\n");

    out.push_str("export default interface ProtobufJs6 {\n");
    out.push_str(&hierarchy_declarations(root, root.root(), 1));
    out.push_str("}\n");
    out
}

/// One level of the nested hierarchy. A message node contributes its own
/// `_Message` member before its children.
fn hierarchy_declarations(root: &Root, ns: NodeId, depth: usize) -> String {
    let tab = "\t".repeat(depth);
    let mut out = String::new();

    if root.node(ns).is_message() {
        let _ = writeln!(
            out,
            "{tab}_Message: TypedType<{}>;",
            namespaced_type_reference(root, ns)
        );
    }
    for sub in child_namespaces(root, ns) {
        let _ = writeln!(out, "{tab}{}: {{", root.node(sub).name);
        out.push_str(&hierarchy_declarations(root, sub, depth + 1));
        let _ = writeln!(out, "{tab}}}");
    }

    out
}

/// A namespace's `index.d.ts`: an `export interface` per direct message and
/// an `export const enum` per direct enum.
fn namespace_file(root: &Root, ns: NodeId) -> Result<String, CodegenError> {
    let mut out = banner(TEMPLATE_NAME);
    out.push('\n');
    out.push_str("import Long = require('long');\n");
    for import in namespace_import_declarations(root, ns) {
        out.push_str(&import);
        out.push('\n');
    }

    for message in child_types(root, ns) {
        out.push('\n');
        out.push_str(&message_interface(root, message)?);
    }
    for enumeration in child_enums(root, ns) {
        out.push('\n');
        out.push_str(&enum_declaration(root, enumeration));
    }

    Ok(out)
}

fn message_interface(root: &Root, message: NodeId) -> Result<String, CodegenError> {
    let node = root.node(message);
    let mut out = format!("export interface {} {{\n", node.name);

    for field in node.fields() {
        if let Some(comment) = &field.comment {
            let _ = writeln!(out, "\t/** {comment} */");
        }
        let context = format!("{}.{}", root.full_name(message), field.name);
        let optional = if field.optional { "?" } else { "" };
        let _ = writeln!(
            out,
            "\t{}{optional}: {};",
            field.name,
            field_ts_type(root, field, &context)?
        );
    }

    out.push_str("}\n");
    Ok(out)
}

fn enum_declaration(root: &Root, enumeration: NodeId) -> String {
    let node = root.node(enumeration);
    let mut out = format!("export const enum {} {{\n", node.name);
    for (name, value) in node.enum_values() {
        let _ = writeln!(out, "\t{name} = {value},");
    }
    out.push_str("}\n");
    out
}
