//! The built-in template sets.
//!
//! Each template renders the whole reflection tree into TypeScript
//! declaration files: `grpc-node` emits client/server typings per service,
//! `protobufjs6` emits message/enum typings per namespace. Both lean on
//! [`crate::paths`] and [`crate::resolve`] for file layout and imports.

use protots_model::{Field, Root, ScalarType, TypeRef};

use crate::resolve::namespaced_type_reference;
use crate::CodegenError;

pub mod grpc_node;
pub mod protobufjs6;

/// The banner at the top of every generated file. Deliberately free of
/// timestamps so regeneration on unchanged input is byte-identical.
pub(crate) fn banner(template_name: &str) -> String {
    format!(
        "/*\nThis file was automatically generated by protots.\n\nTemplate: {template_name}\n\n- Do not edit this file\n- Do not check this file into version control\n*/\n"
    )
}

/// The TypeScript type for a proto scalar. 64-bit integers map to `Long`.
pub(crate) fn scalar_ts_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Double
        | ScalarType::Float
        | ScalarType::Int32
        | ScalarType::Uint32
        | ScalarType::Sint32
        | ScalarType::Fixed32
        | ScalarType::Sfixed32 => "number",
        ScalarType::Int64
        | ScalarType::Uint64
        | ScalarType::Sint64
        | ScalarType::Fixed64
        | ScalarType::Sfixed64 => "Long",
        ScalarType::Bool => "boolean",
        ScalarType::String => "string",
        ScalarType::Bytes => "Uint8Array",
    }
}

/// The TypeScript type expression for a field, including the repeated `[]`
/// suffix. An unresolved reference here is an upstream invariant violation
/// and fails with the field's full path.
pub(crate) fn field_ts_type(
    root: &Root,
    field: &Field,
    context: &str,
) -> Result<String, CodegenError> {
    let base = match &field.ty {
        TypeRef::Scalar(scalar) => scalar_ts_type(*scalar).to_string(),
        TypeRef::Resolved(id) => namespaced_type_reference(root, *id),
        TypeRef::Named(_) => return Err(CodegenError::UnresolvedType(context.to_string())),
    };

    if field.repeated {
        Ok(format!("{base}[]"))
    } else {
        Ok(base)
    }
}
