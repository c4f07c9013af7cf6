//! End-to-end behaviour of the `remove` transformer.

use camino::Utf8PathBuf;
use dts_bundler::{BundledChunk, OutputOptions};
use dts_transformer::{
    apply_transformers, RemoveOptions, RemoveTransformer, SharedTransformer, TransformContext,
    TransformError,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const TAG: &str = "@internal";

fn remover(options: RemoveOptions) -> RemoveTransformer {
    RemoveTransformer::new(options).unwrap()
}

fn transform(code: &str) -> String {
    let transformer = remover(RemoveOptions {
        annotation_tags: vec!["internal".into()],
        ..Default::default()
    });
    transformer
        .run(code, "types.d.ts")
        .unwrap()
        .unwrap_or_else(|| code.to_string())
}

#[test]
fn test_removes_class() {
    let out = transform(
        r#"
    /**
     * @internal
     */
    class A {}
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(out.contains("/* removed internal: A */"));
}

#[test]
fn test_removes_class_property() {
    let out = transform(
        r#"
    class A {
      /**
       * @internal
       */
      private a: string = 5;
    }
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(!out.contains("private a"));
}

#[test]
fn test_removes_class_method() {
    let out = transform(
        r#"
    class A {
      /**
       * @internal
       */
      private test(): void {}
    }
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(!out.contains("test()"));
}

#[test]
fn test_removes_interface_and_members() {
    let out = transform(
        r#"
    /**
     * @internal
     */
    interface A {}

    interface B {
      /**
       * @internal
       */
      test(): void;
      /**
       * @internal
       */
      a: string;
      b: number;
    }
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(!out.contains("test(): void"));
    assert!(!out.contains("a: string"));
    assert!(out.contains("b: number;"));
}

#[test]
fn test_removes_nested_type_literal_members() {
    let out = transform(
        r#"
    type A = B & {
      /**
       * @internal
       */
      a: string;
      c: number
    } & Array<{
      /**
       * @internal
       */
      f: string;
    }>
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(!out.contains("a: string"));
    assert!(!out.contains("f: string"));
    assert!(out.contains("c: number"));
}

#[test]
fn test_removes_enum_and_its_export() {
    let out = transform(
        r#"
    /**
     * @internal
     */
    enum Test1 {}

    enum Test2 {
      /* @internal */
      a = 5,
      b = 6,
    }

    export { Test1, Test2 }
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(!out.contains("export { Test1"));
    assert!(out.contains("export { Test2 }"));
    assert!(out.contains("b = 6"));
}

#[test]
fn test_removes_variables_and_nested_annotations() {
    let out = transform(
        r#"
    /**
     * @internal
     */
    const a = 5;

    let b: string;

    declare const c: {
      /**
       * @internal
       */
      d: string;
      f: number;
      e: {
        /**
         * @internal
         */
        g: boolean;
        h: number[];
      }
    }

    export { a, b, c }
    "#,
    );
    assert!(!out.contains(TAG));
    assert!(!out.contains("export { a"));
    assert!(out.contains("export { b, c }"));
    assert!(out.contains("h: number[];"));
}

#[test]
fn test_export_list_keeps_neighbours_intact() {
    let out = transform(
        "export { A, B, C };\ndeclare class A {}\n/** @internal */\ndeclare class B {}\ndeclare class C {}\n",
    );
    assert_eq!(
        out,
        "export { A, C };\ndeclare class A {}\n/* removed internal: B */\ndeclare class C {}\n"
    );
}

#[test]
fn test_untagged_input_is_returned_unchanged() {
    let transformer = remover(RemoveOptions {
        annotation_tags: vec!["internal".into()],
        ..Default::default()
    });
    let code = "/** Public API. */\nexport declare function f(): void;\nexport { f as g };\n";
    assert_eq!(transformer.run(code, "types.d.ts").unwrap(), None);
}

#[test]
fn test_multi_binding_declaration_is_rejected() {
    let transformer = remover(RemoveOptions {
        annotation_tags: vec!["internal".into()],
        ..Default::default()
    });
    let err = transformer
        .run("/** @internal */\ndeclare const a: 1, b: 2;\n", "types.d.ts")
        .unwrap_err();
    assert!(matches!(err, TransformError::DuplicateDeclarator { .. }));
}

#[test]
fn test_empty_imports_are_removed() {
    let transformer = remover(RemoveOptions {
        remove_empty_import: true,
        ..Default::default()
    });
    let out = transformer
        .run(
            "\nimport {} from 'a';\nimport { B } from 'b';\nimport 'c';\n",
            "types.d.ts",
        )
        .unwrap()
        .unwrap();
    assert!(!out.contains("'a'"));
    assert!(!out.contains("'c'"));
    assert!(out.contains("import { B } from 'b';"));
}

#[test]
fn test_type_keywords_are_removed() {
    let transformer = remover(RemoveOptions {
        remove_type_keyword: true,
        ..Default::default()
    });
    let out = transformer
        .run(
            "import type { A } from 'a';\nexport type B = A;\nexport type { B as C };\n",
            "types.d.ts",
        )
        .unwrap()
        .unwrap();
    insta::assert_snapshot!(out, @r###"
    import { A } from 'a';
    export type B = A;
    export { B as C };
    "###);
}

#[test]
fn test_runs_inside_a_chain() {
    let chain: Vec<SharedTransformer> = vec![
        Arc::new(remover(RemoveOptions {
            annotation_tags: vec!["internal".into()],
            ..Default::default()
        })),
        Arc::new(remover(RemoveOptions {
            remove_type_keyword: true,
            ..Default::default()
        })),
    ];
    let chunk = BundledChunk {
        name: "index".into(),
        file_name: "index.d.ts".into(),
        code: "import type { Secret } from './secret';\n/** @internal */\nexport declare const s: Secret;\nexport type { Secret };\n".into(),
        is_entry: true,
        facade_module_id: None,
        module_ids: Vec::new(),
        exports: vec!["s".into()],
    };
    let root = Utf8PathBuf::from("/project");
    let chunks = IndexMap::new();
    let output = OutputOptions::default();
    let ctx = TransformContext {
        root: &root,
        chunks: &chunks,
        output: &output,
    };
    let out = apply_transformers(&chain, &chunk, &ctx).unwrap();
    assert_eq!(
        out,
        "import { Secret } from './secret';\n/* removed internal: s */\nexport { Secret };\n"
    );
}
