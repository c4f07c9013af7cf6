//! Component script compilation.

use pretty_assertions::assert_eq;
use sfc_transformer::{compile_script, CompileError, CompileOptions, CompiledScript};
use text_edit::ByteOffset;

fn compile(source: &str) -> Result<CompiledScript, CompileError> {
    let descriptor = sfc_parser::parse(source).unwrap();
    compile_script(
        &descriptor,
        &CompileOptions {
            filename: "Comp.vue".to_string(),
        },
    )
}

#[test]
fn test_script_less_component() {
    let script = compile("<template><div/></template>\n<style>.a{}</style>").unwrap();
    assert_eq!(script.code, sfc_transformer::DEFAULT_COMPONENT);
    assert_eq!(script.lang, "ts");
    assert!(script.source_map.is_empty());
}

#[test]
fn test_normal_script_is_copied() {
    let source = "<template><p/></template>\n<script lang=\"tsx\">\nexport default { name: 'A' };\n</script>";
    let script = compile(source).unwrap();
    assert_eq!(script.code, "\nexport default { name: 'A' };\n");
    assert_eq!(script.lang, "tsx");

    let original = script
        .source_map
        .original_position(ByteOffset::from(1))
        .unwrap();
    assert_eq!(&source[usize::from(original)..][..14], "export default");
}

#[test]
fn test_script_setup_with_type_macros() {
    let script = compile(
        "<script setup lang=\"ts\">\nimport { ref } from 'vue';\ninterface Props { msg: string }\nconst props = defineProps<Props>();\nconst emit = defineEmits<{ change: [id: number] }>();\nconst count = ref(0);\n</script>\n<template>{{ count }}</template>",
    )
    .unwrap();
    assert_eq!(script.lang, "ts");
    insta::assert_snapshot!(script.code, @r###"
    import type { DefineComponent as __DefineComponent } from 'vue';
    import { ref } from 'vue';
    interface Props { msg: string }
    type __EmitsOptions<T> = T extends (...args: any[]) => any ? string[] : { [K in keyof T]: (...args: T[K] extends any[] ? T[K] : any[]) => any };
    type __EmitFn<T> = T extends (...args: any[]) => any ? T : <K extends keyof T>(event: K, ...args: T[K] extends any[] ? T[K] : any[]) => void;
    function __setup(__props: Props, __emit: __EmitFn<{ change: [id: number] }>) {
    const props = __props;
    const emit = __emit;
    const count = ref(0);
    return { props, emit, count };
    }
    void __setup;
    declare const _default: __DefineComponent<Props, {}, {}, {}, {}, {}, {}, __EmitsOptions<{ change: [id: number] }>>;
    export default _default;
    "###);
}

#[test]
fn test_script_setup_merged_with_normal_script() {
    let script = compile(
        "<script lang=\"ts\">\nexport default { name: 'Counter' };\n</script>\n<script setup lang=\"ts\">\nconst props = withDefaults(defineProps<{ step?: number }>(), { step: 1 });\nconst emit = defineEmits(['inc', 'reset']);\ndefineExpose({ reset: () => emit('reset') });\n</script>",
    )
    .unwrap();
    insta::assert_snapshot!(script.code, @r###"
    import type { DefineComponent as __DefineComponent } from 'vue';

    const __default__ = { name: 'Counter' };
    function __setup(__props: { step?: number }, __emit: (event: "inc" | "reset", ...args: any[]) => void) {
    const props = __props;
    const emit = __emit;
    (undefined as any);
    return { props, emit };
    }
    void __setup;
    void __default__;
    declare const _default: __DefineComponent<{ step?: number }, {}, {}, {}, {}, {}, {}, ("inc" | "reset")[]>;
    export default _default;
    "###);
}

#[test]
fn test_runtime_props_and_array_props() {
    let script = compile(
        "<script setup lang=\"ts\">\nconst props = defineProps({ msg: String });\n</script>",
    )
    .unwrap();
    assert!(script.code.starts_with(
        "import type { DefineComponent as __DefineComponent, ExtractPropTypes as __ExtractPropTypes } from 'vue';\n"
    ));
    assert!(script
        .code
        .contains("const __propsOptions = { msg: String };\n"));
    assert!(script
        .code
        .contains("function __setup(__props: __ExtractPropTypes<typeof __propsOptions>, __emit: (event: string, ...args: any[]) => void) {"));
    assert!(script
        .code
        .contains("__DefineComponent<typeof __propsOptions, {}, {}, {}, {}, {}, {}, {}>"));

    let script =
        compile("<script setup>\ndefineProps(['title', 'aria-label']);\n</script>").unwrap();
    assert_eq!(script.lang, "ts");
    assert!(script
        .code
        .contains("__DefineComponent<{ title?: any; \"aria-label\"?: any }, "));
}

#[test]
fn test_setup_body_maps_back_to_component() {
    let source = "<script setup lang=\"ts\">\nconst count = ref(0);\n</script>";
    let script = compile(source).unwrap();
    let generated = script.code.find("ref(0)").unwrap();
    let original = script
        .source_map
        .original_position(ByteOffset::from(generated as u32))
        .unwrap();
    assert_eq!(usize::from(original), source.find("ref(0)").unwrap());
}

#[test]
fn test_exports_in_script_setup_are_rejected() {
    let source = "<script setup lang=\"ts\">\nexport const a = 1;\n</script>";
    let err = compile(source).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported { .. }));
    assert_eq!(&source[err.span().range()], "export const a = 1;");

    // Type exports are hoisted instead.
    let script =
        compile("<script setup lang=\"ts\">\nexport interface Item { id: number }\n</script>")
            .unwrap();
    assert!(script.code.contains("\nexport interface Item { id: number }\n"));
}

#[test]
fn test_syntax_error_points_into_component() {
    let source = "<template></template>\n<script setup lang=\"ts\">\nconst = 1;\n</script>";
    let err = compile(source).unwrap_err();
    let CompileError::Syntax { block, span, .. } = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(*block, "script setup");
    let content_start = source.find("\nconst").unwrap();
    assert!(usize::from(span.start) >= content_start);
    assert!(usize::from(span.start) < source.find("</script>").unwrap());
}
