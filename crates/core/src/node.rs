//! Node.js package naming and built-in modules

/// Modules provided by the Node.js runtime itself.
pub const NATIVE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// The `@types` package providing typings for the Node.js runtime.
pub const NODE_TYPES_PACKAGE: &str = "@types/node";

/// Whether an import refers to a Node.js built-in, such as `fs`,
/// `fs/promises` or `node:test`.
pub fn is_node_import(imp: &str) -> bool {
    if let Some(rest) = imp.strip_prefix("node:") {
        return !rest.is_empty();
    }

    let module = imp.split('/').next().unwrap_or(imp);
    NATIVE_MODULES.contains(&module)
}

/// Split an import into its package name and the path within the package.
///
/// Relative, absolute and empty imports have no package: `("", imp)`.
pub fn parse_import_path(imp: &str) -> (&str, &str) {
    if imp.is_empty() || imp.starts_with('/') || imp.starts_with('.') {
        return ("", imp);
    }

    if imp.starts_with('@') {
        let Some(scope_end) = imp.find('/') else {
            return ("", imp);
        };
        let sub_pkg = &imp[scope_end + 1..];
        return match sub_pkg.find('/') {
            None => (imp.trim_end_matches('/'), ""),
            Some(sub_end) => (&imp[..scope_end + sub_end + 1], &sub_pkg[sub_end + 1..]),
        };
    }

    match imp.find('/') {
        None => (imp, ""),
        Some(end) => (&imp[..end], &imp[end + 1..]),
    }
}

/// The `@types` package for a package import: `@types/x` for `x/...`,
/// `@types/scope__pkg` for `@scope/pkg/...`. `None` for non-package imports
/// and imports of `@types` packages themselves.
pub fn to_at_types_package(imp: &str) -> Option<String> {
    let (pkg, _) = parse_import_path(imp);
    if pkg.is_empty() || pkg.starts_with("@types/") {
        return None;
    }

    match pkg.strip_prefix('@') {
        Some(scoped) => {
            let (scope, name) = scoped.split_once('/')?;
            if name.is_empty() {
                return None;
            }
            Some(format!("@types/{scope}__{name}"))
        }
        None => Some(format!("@types/{pkg}")),
    }
}
