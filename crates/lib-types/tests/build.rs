//! Whole builds over on-disk projects, using the in-process checker.

use camino::Utf8PathBuf;
use dts_bundler::EntrySpec;
use dts_transformer::{RemoveOptions, RemoveTransformer};
use indexmap::IndexMap;
use lib_types::{build, write_assets, BuildError, BuildOptions};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use tsc_runner::CheckerKind;

struct Project {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("tsconfig.json"), "{ \"compilerOptions\": { \"strict\": true } }").unwrap();
        fs::write(
            root.join("package.json"),
            r#"{ "name": "@scope/mylib", "version": "0.1.0" }"#,
        )
        .unwrap();
        for (path, text) in files {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, text).unwrap();
        }
        Self { _dir: dir, root }
    }

    fn options(&self) -> BuildOptions {
        BuildOptions::new(&self.root).checker(CheckerKind::Isolated)
    }
}

const INDEX: &str = "export { greet } from './greet';\n\n/** @internal */\nexport const secret: number = 1;\n\nexport const version = '1.0.0';\n";
const GREET: &str = "export function greet(name: string): string {\n  return `hi ${name}`;\n}\n";

#[tokio::test]
async fn test_single_entry_is_named_after_the_package() {
    let project = Project::new(&[("src/index.ts", INDEX), ("src/greet.ts", GREET)]);

    let assets = build(&project.options()).await.unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].name, "index");
    assert_eq!(assets[0].file_name, "mylib.d.ts");

    let code = &assets[0].source;
    assert!(code.contains("declare function greet(name: string): string;"));
    assert!(code.contains("declare const version: '1.0.0';"));
    assert!(code.contains("@internal"));
    assert!(!project.root.join("dist/.temp").exists());
}

#[tokio::test]
async fn test_internal_declarations_are_removed() {
    let project = Project::new(&[("src/index.ts", INDEX), ("src/greet.ts", GREET)]);
    let remove = RemoveTransformer::new(RemoveOptions {
        annotation_tags: vec!["internal".into()],
        ..RemoveOptions::default()
    })
    .unwrap();

    let assets = build(&project.options().transformer(Arc::new(remove)))
        .await
        .unwrap();
    let code = &assets[0].source;
    assert!(!code.contains("@internal"));
    assert!(!code.contains("declare const secret"));

    let exports = code
        .lines()
        .find(|line| line.starts_with("export {"))
        .unwrap();
    assert!(exports.contains("greet"));
    assert!(exports.contains("version"));
    assert!(!exports.contains("secret"));
}

#[tokio::test]
async fn test_multiple_entries_use_their_aliases() {
    let project = Project::new(&[
        ("src/a.ts", "export const a: number = 1;\n"),
        ("src/b.ts", "export const b: string = 'b';\n"),
    ]);
    let options = project.options().entry(EntrySpec::List(vec![
        "src/a.ts".into(),
        "src/b.ts".into(),
    ]));

    let assets = build(&options).await.unwrap();
    let names: Vec<(&str, &str)> = assets
        .iter()
        .map(|asset| (asset.name.as_str(), asset.file_name.as_str()))
        .collect();
    assert_eq!(names, vec![("a", "a.d.ts"), ("b", "b.d.ts")]);

    let written = write_assets(&project.root.join("dist"), &assets).unwrap();
    assert_eq!(
        fs::read_to_string(&written[1]).unwrap(),
        assets[1].source
    );
}

#[tokio::test]
async fn test_component_entries_are_pre_parsed() {
    let project = Project::new(&[
        ("src/Button.vue", "<template><button><slot /></button></template>\n"),
        ("src/index.ts", "export const ok: boolean = true;\n"),
    ]);
    let mut entries = IndexMap::new();
    entries.insert("button".to_string(), Utf8PathBuf::from("src/Button.vue"));
    entries.insert("index".to_string(), Utf8PathBuf::from("src/index.ts"));

    let assets = build(&project.options().entry(EntrySpec::Map(entries)))
        .await
        .unwrap();
    assert_eq!(assets[0].file_name, "button.d.ts");
    assert!(assets[0].source.contains("from \"vue\""));
    assert!(assets[0]
        .source
        .contains("ReturnType<typeof defineComponent>"));
}

#[tokio::test]
async fn test_type_errors_fail_without_output() {
    let project = Project::new(&[
        ("src/index.ts", "export { parse } from './parse';\n"),
        ("src/parse.ts", "export function parse(input) {\n  return input;\n}\n"),
    ]);

    let err = build(&project.options()).await.unwrap_err();
    match &err {
        BuildError::Diagnostics { count, report } => {
            assert_eq!(*count, 1);
            assert!(report.starts_with("src/parse.ts:1:23\nError: "), "{report}");
        }
        other => panic!("expected diagnostics, got {other:?}"),
    }
    assert!(!project.root.join("dist").join(".temp").exists());
    assert!(!project.root.join("dist/mylib.d.ts").exists());
}

#[tokio::test]
async fn test_no_emit_only_checks() {
    let project = Project::new(&[("src/index.ts", "export const a: number = 1;\n")]);

    let assets = build(&project.options().no_emit(true)).await.unwrap();
    assert!(assets.is_empty());
    assert!(!project.root.join("dist/.temp").exists());
}

#[tokio::test]
async fn test_missing_tsconfig_is_a_configuration_error() {
    let project = Project::new(&[("src/index.ts", "export {};\n")]);
    let mut options = project.options();
    options.tsconfig_path = Some("tsconfig.build.json".into());

    let err = build(&options).await.unwrap_err();
    assert!(matches!(err, BuildError::Config(_)), "{err:?}");
}
