// Test utility module for methodset integration tests
#![allow(dead_code)]

use methodset::{
    MethodDeclaration, MethodSetResolver, RequiredMethod, ResolverConfig, Signature,
    TypeDeclaration, TypeGraph,
};
use std::path::PathBuf;

/// Route `log` output through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn string_to_string() -> Signature {
    Signature::new(["string"], ["string"])
}

pub fn unit_method(name: &str) -> MethodDeclaration {
    MethodDeclaration::by_value(name, Signature::unit())
}

pub fn unit_ref_method(name: &str) -> MethodDeclaration {
    MethodDeclaration::by_reference(name, Signature::unit())
}

pub fn unit_requirement(name: &str) -> RequiredMethod {
    RequiredMethod::new(name, Signature::unit())
}

/// Declare everything in order, panicking on the first rejected declaration
pub fn graph_of(decls: Vec<TypeDeclaration>) -> TypeGraph {
    let mut graph = TypeGraph::new();
    for decl in decls {
        graph
            .declare(decl)
            .expect("declaration should be accepted");
    }
    graph
}

pub fn resolver_of(decls: Vec<TypeDeclaration>) -> MethodSetResolver {
    resolver_with(decls, ResolverConfig::default())
}

pub fn resolver_with(decls: Vec<TypeDeclaration>, config: ResolverConfig) -> MethodSetResolver {
    MethodSetResolver::with_config(graph_of(decls), config).expect("graph should validate")
}

/// The greeter scenario: two plain greeters and one composed greeter that
/// embeds a prefixer
pub fn greeter_declarations() -> Vec<TypeDeclaration> {
    vec![
        TypeDeclaration::interface("Greeter")
            .require(RequiredMethod::new("greet", string_to_string())),
        TypeDeclaration::composite("englishGreeter")
            .with_method(MethodDeclaration::by_value("greet", string_to_string())),
        TypeDeclaration::composite("italianGreeter")
            .with_method(MethodDeclaration::by_value("greet", string_to_string())),
        TypeDeclaration::composite("prefixer")
            .with_method(MethodDeclaration::by_value("apply", string_to_string())),
        TypeDeclaration::composite("composedGreeter")
            .embed("prefixer")
            .with_method(MethodDeclaration::by_value("greet", string_to_string())),
    ]
}

// Helper to create temporary test files
pub fn create_test_file(content: &str, extension: &str) -> (tempfile::TempDir, PathBuf) {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join(format!("graph.{}", extension));
    std::fs::write(&file_path, content).expect("Failed to write test file");
    (temp_dir, file_path)
}
