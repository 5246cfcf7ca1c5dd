//! The `grpc-node` template: typed client and server declarations for the
//! `grpc` npm package.
//!
//! Emits one top-level `grpc-node.d.ts` mirroring the loaded package
//! hierarchy down to each service's `ClientConstructor`, plus one
//! `grpc-node.d.ts` per service with `Service`, `ClientConstructor` and
//! `Client` interfaces. Method signatures vary with the four
//! request/response streaming shapes.

use std::fmt::Write;

use protots_model::{Method, NodeId, Root, TypeRef};

use crate::paths::{child_namespaces, child_services, output_file_path, services_transitive};
use crate::resolve::{import_path, import_reference, namespace_import_declarations,
    namespaced_type_reference};
use crate::templates::banner;
use crate::{CodegenError, Template};

const TEMPLATE_NAME: &str = "grpc-node";
const FILE_NAME: &str = "grpc-node.d.ts";

pub struct GrpcNodeTemplate;

impl Template for GrpcNodeTemplate {
    fn name(&self) -> &'static str {
        TEMPLATE_NAME
    }

    fn render(&self, root: &Root) -> Result<Vec<(String, String)>, CodegenError> {
        let mut files = vec![(FILE_NAME.to_string(), top_level_file(root))];
        for service in services_transitive(root, root.root()) {
            files.push((
                output_file_path(root, service, FILE_NAME),
                service_file(root, service)?,
            ));
        }
        Ok(files)
    }
}

/// The root `grpc-node.d.ts`: imports every service file and re-exposes the
/// package hierarchy as nested object types ending in `ClientConstructor`s.
fn top_level_file(root: &Root) -> String {
    let mut out = banner(TEMPLATE_NAME);
    out.push_str("import { GrpcObject } from 'grpc';\n");

    for service in services_transitive(root, root.root()) {
        let _ = writeln!(
            out,
            "import * as {} from '{}/grpc-node';",
            import_reference(root, service),
            import_path(root, service, root.root())
        );
    }

    out.push('\n');
    out.push_str("export default interface Grpc extends GrpcObject {\n");
    out.push_str(&hierarchy_declarations(root, root.root(), 1));
    out.push_str("}\n");
    out
}

/// One level of the nested hierarchy: services as `ClientConstructor`
/// members, sub-namespaces recursed into only when they contain a service.
fn hierarchy_declarations(root: &Root, ns: NodeId, depth: usize) -> String {
    let tab = "\t".repeat(depth);
    let mut out = String::new();

    for service in child_services(root, ns) {
        let _ = writeln!(
            out,
            "{tab}{}: {}.ClientConstructor;",
            root.node(service).name,
            import_reference(root, service)
        );
    }
    for sub in child_namespaces(root, ns) {
        if services_transitive(root, sub).is_empty() {
            continue;
        }
        let _ = writeln!(out, "{tab}{}: {{", root.node(sub).name);
        out.push_str(&hierarchy_declarations(root, sub, depth + 1));
        let _ = writeln!(out, "{tab}}}");
    }

    out
}

fn service_file(root: &Root, service: NodeId) -> Result<String, CodegenError> {
    let methods = root.node(service).methods();

    let mut out = banner(TEMPLATE_NAME);
    out.push_str("import Long = require('long');\n");
    out.push_str(
        "import {\n\
         \tClient as GrpcClient, Metadata, CallOptions, ChannelCredentials,\n\
         \tServerUnaryCall, ServiceDefinition,\n\
         \tServerReadableStream, ServerWriteableStream, ServerDuplexStream,\n\
         \tClientReadableStream, ClientWritableStream, ClientDuplexStream,\n\
         \tsendUnaryData, requestCallback\n\
         } from 'grpc';\n",
    );
    for import in namespace_import_declarations(root, service) {
        out.push_str(&import);
        out.push('\n');
    }

    out.push_str("\nexport interface Service {\n");
    for method in methods {
        out.push('\t');
        out.push_str(&server_method(root, service, method)?);
        out.push('\n');
    }
    out.push_str("}\n");

    out.push_str("\nexport interface ClientConstructor {\n");
    out.push_str("\tservice: ServiceDefinition<Service>;\n");
    out.push_str(
        "\tnew(address: string, credentials: ChannelCredentials, options?: object): Client;\n",
    );
    out.push_str("}\n");

    out.push_str("\nexport interface Client extends GrpcClient {\n");
    for method in methods {
        out.push('\t');
        out.push_str(&client_method(root, service, method)?);
        out.push('\n');
    }
    out.push_str("}\n");

    Ok(out)
}

/// The request and response type references for a method. Both must have
/// been resolved by the loader; anything else is fatal.
fn method_types(
    root: &Root,
    service: NodeId,
    method: &Method,
) -> Result<(String, String), CodegenError> {
    let reference = |ty: &TypeRef| match ty {
        TypeRef::Resolved(id) => Ok(namespaced_type_reference(root, *id)),
        _ => Err(CodegenError::UnresolvedType(format!(
            "{}.{}",
            root.full_name(service),
            method.name
        ))),
    };
    Ok((reference(&method.request)?, reference(&method.response)?))
}

fn server_method(root: &Root, service: NodeId, method: &Method) -> Result<String, CodegenError> {
    let (request, response) = method_types(root, service, method)?;
    let name = &method.name;

    Ok(match (method.request_stream, method.response_stream) {
        (true, true) => format!("{name}(call: ServerDuplexStream<{request}, {response}>): void;"),
        (false, true) => format!("{name}(call: ServerWriteableStream<{request}>): void;"),
        (true, false) => format!(
            "{name}(call: ServerReadableStream<{request}>, callback: sendUnaryData<{response}>): void;"
        ),
        (false, false) => format!(
            "{name}(call: ServerUnaryCall<{request}>, callback: sendUnaryData<{response}>): void;"
        ),
    })
}

fn client_method(root: &Root, service: NodeId, method: &Method) -> Result<String, CodegenError> {
    let (request, response) = method_types(root, service, method)?;
    let name = &method.name;

    Ok(match (method.request_stream, method.response_stream) {
        (true, true) => format!(
            "{name}(metadata?: Metadata | null, options?: CallOptions | null): ClientDuplexStream<{request}, {response}>;"
        ),
        (false, true) => format!(
            "{name}(arg: {request}, metadata?: Metadata | null, options?: CallOptions | null): ClientReadableStream<{response}>;"
        ),
        (true, false) => format!(
            "{name}(metadata: Metadata | null, options: CallOptions | null, callback: requestCallback<{response}>): ClientWritableStream<{request}>;"
        ),
        (false, false) => format!(
            "{name}(arg: {request}, metadata: Metadata | null, options: CallOptions | null, callback: requestCallback<{response}>): void;"
        ),
    })
}
