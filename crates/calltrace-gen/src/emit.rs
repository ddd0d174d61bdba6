//! Rust source for a [`GeneratedApi`].
//!
//! The output is a module of `extern "system"` shims with the same signatures as the real
//! entry points. Each shim body is the unrolled [`crate::ShimCall`] step sequence; the real
//! entry point is reached through [`crate::Resolver::symbol`] (functions) or the native
//! object's vtable (methods).
//!
//! [`RustEmitter::emit`] produces a standalone module file. [`RustEmitter::emit_items`] leaves
//! out the inner attributes so the output can be pulled into a module with `include!`.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use calltrace_api::{Api, Primitive, StringKind, Type};

use crate::capture::scalar_prim;
use crate::plan::{ArgPlan, GeneratedApi, ShimPlan};

const VOID: &str = "::core::ffi::c_void";

const LINT_ALLOWS: &str =
    "#![allow(non_snake_case, non_camel_case_types, non_upper_case_globals, dead_code)]\n\
     #![allow(clippy::missing_safety_doc, clippy::too_many_arguments)]\n";

pub struct RustEmitter<'a> {
    generated: &'a GeneratedApi,
    out: String,
}

impl<'a> RustEmitter<'a> {
    pub fn new(generated: &'a GeneratedApi) -> Self {
        Self {
            generated,
            out: String::new(),
        }
    }

    pub fn emit(self) -> String {
        let mut out = String::from(LINT_ALLOWS);
        out.push_str(&self.emit_items());
        out
    }

    /// The module body without inner attributes.
    pub fn emit_items(mut self) -> String {
        self.header();
        self.aliases();
        self.enums();
        self.structs();
        self.runtime();
        let generated = self.generated;
        for (index, plan) in generated.functions.iter().enumerate() {
            self.function_shim(index, plan);
        }
        for index in 0..generated.interfaces.len() {
            self.interface(index);
        }
        self.out
    }

    fn api(&self) -> &'a Api {
        &self.generated.api
    }

    fn header(&mut self) {
        let _ = writeln!(
            self.out,
            "// Generated by calltrace-codegen for the `{}` API. Do not edit.",
            self.api().name()
        );
        self.out.push_str(
            "use std::sync::OnceLock;\n\n\
             #[allow(unused_imports)]\n\
             use calltrace_gen::{vtable_entry, Interceptor};\n\n",
        );
    }

    fn aliases(&mut self) {
        let mut aliases = BTreeMap::new();
        let mut visit = |ty: &Type| collect_aliases(self.api(), ty, &mut aliases);
        for plan in self.all_plans() {
            plan.ret.iter().for_each(&mut visit);
            plan.args.iter().for_each(|a| visit(&a.ty));
        }
        for def in self.api().structs() {
            def.fields.iter().for_each(|f| visit(&f.field.ty));
        }
        for (name, target) in aliases {
            let _ = writeln!(self.out, "pub type {name} = {target};");
        }
        self.out.push('\n');
    }

    /// Type aliases and constants. A constant name shared by several enums or flag sets is
    /// emitted once, for the first declaration.
    fn enums(&mut self) {
        let api = self.api();
        let mut taken: HashSet<&str> = HashSet::new();
        for def in api.enums() {
            let _ = writeln!(self.out, "pub type {} = {};", def.name, def.repr.rust_name());
            for value in &def.values {
                if !taken.insert(value.name.as_str()) {
                    continue;
                }
                let _ = writeln!(
                    self.out,
                    "pub const {}: {} = {}_i64 as {};",
                    value.name, def.name, value.value, def.name
                );
            }
            self.out.push('\n');
        }
        for def in api.all_flags() {
            let _ = writeln!(self.out, "pub type {} = {};", def.name, def.repr.rust_name());
            for bit in &def.bits {
                if !taken.insert(bit.name.as_str()) {
                    continue;
                }
                let _ = writeln!(self.out, "pub const {}: {} = {:#x};", bit.name, def.name, bit.value);
            }
            self.out.push('\n');
        }
    }

    fn structs(&mut self) {
        let api = self.api();
        for def in api.structs() {
            self.out.push_str("#[repr(C)]\n");
            if def.opaque {
                let _ = writeln!(self.out, "pub struct {} {{\n    _opaque: [u8; 0],\n}}\n", def.name);
                continue;
            }
            self.out.push_str("#[derive(Clone, Copy)]\n");
            let _ = writeln!(self.out, "pub struct {} {{", def.name);
            for field in &def.fields {
                let ty = match (field.inline_count, field.field.ty.canonical()) {
                    (Some(n), Type::Array { element, .. }) => {
                        format!("[{}; {n}]", rust_type(api, element))
                    }
                    _ => rust_type(api, &field.field.ty),
                };
                if let Some(size) = &field.size {
                    let _ = writeln!(self.out, "    /// `{}` elements.", size.source);
                }
                let _ = writeln!(self.out, "    pub {}: {ty},", ident(&field.field.name));
            }
            self.out.push_str("}\n\n");
        }
    }

    fn runtime(&mut self) {
        self.out.push_str(
            "static INTERCEPTOR: OnceLock<Interceptor> = OnceLock::new();\n\n\
             /// Installs the interceptor every shim below records through. Returns `false` when\n\
             /// one was already installed.\n\
             pub fn install(interceptor: Interceptor) -> bool {\n",
        );
        let generated = self.generated;
        self.out.push_str("    let interceptor = interceptor");
        for plan in &generated.functions {
            let _ = write!(
                self.out,
                "\n        .with_symbol(\"{0}\", {0} as usize)",
                plan.name()
            );
        }
        for interface in &generated.interfaces {
            let _ = write!(
                self.out,
                "\n        .with_vtable(\"{0}\", &{0}_VTBL as *const {0}Vtbl as usize)",
                interface.name
            );
        }
        self.out
            .push_str(";\n    INTERCEPTOR.set(interceptor).is_ok()\n}\n\n");
        self.out.push_str(
            "fn interceptor() -> &'static Interceptor {\n\
             \x20   match INTERCEPTOR.get() {\n\
             \x20       Some(interceptor) => interceptor,\n\
             \x20       None => std::process::abort(),\n\
             \x20   }\n\
             }\n\n",
        );
    }

    fn all_plans(&self) -> impl Iterator<Item = &'a ShimPlan> {
        let generated = self.generated;
        generated.functions.iter().map(|p| p.as_ref()).chain(
            generated
                .interfaces
                .iter()
                .flat_map(|i| i.slots.iter().map(|p| p.as_ref())),
        )
    }

    fn function_shim(&mut self, index: usize, plan: &ShimPlan) {
        let api = self.api();
        let params = self.param_list(plan, false);
        let ret = ret_type(api, plan);
        let _ = writeln!(self.out, "#[no_mangle]");
        let _ = writeln!(
            self.out,
            "pub unsafe extern \"system\" fn {}({params}){ret} {{",
            plan.name()
        );
        self.begin_call(plan, &format!("interceptor.function_at({index})"), "None");
        let fn_type = self.fn_type(plan, false);
        match &plan.ret {
            Some(ty) => {
                let _ = writeln!(
                    self.out,
                    "    let Some(real) = call.real_symbol() else {{\n        return {};\n    }};",
                    from_word(api, Some(ty), "call.unresolved()")
                );
            }
            None => self.out.push_str(
                "    let Some(real) = call.real_symbol() else {\n        \
                 call.unresolved();\n        return;\n    };\n",
            ),
        }
        let _ = writeln!(
            self.out,
            "    let real: {fn_type} = ::core::mem::transmute::<usize, {fn_type}>(real);"
        );
        self.finish_call(plan, "real", false);
    }

    fn interface(&mut self, index: usize) {
        let api = self.api();
        let generated = self.generated;
        let interface = &generated.interfaces[index];
        let names = slot_names(interface.slots.iter().map(|p| p.name()));
        let _ = writeln!(self.out, "// {}", interface.chain.join(" -> "));
        let _ = writeln!(self.out, "#[repr(C)]\npub struct {}Vtbl {{", interface.name);
        for (plan, name) in interface.slots.iter().zip(&names) {
            let _ = writeln!(self.out, "    pub {name}: {},", self.fn_type(plan, true));
        }
        self.out.push_str("}\n\n");
        let _ = writeln!(
            self.out,
            "pub static {0}_VTBL: {0}Vtbl = {0}Vtbl {{",
            interface.name
        );
        for name in &names {
            let _ = writeln!(self.out, "    {name}: {}_{name},", interface.name);
        }
        self.out.push_str("};\n\n");

        for (slot, (plan, name)) in interface.slots.iter().zip(&names).enumerate() {
            let params = self.param_list(plan, true);
            let ret = ret_type(api, plan);
            let _ = writeln!(
                self.out,
                "unsafe extern \"system\" fn {}_{name}({params}){ret} {{",
                interface.name,
            );
            self.begin_call(
                plan,
                &format!("interceptor.method_at({index}, {slot})"),
                "Some(this as usize)",
            );
            let fn_type = self.fn_type(plan, true);
            let _ = writeln!(
                self.out,
                "    let real: {fn_type} =\n        ::core::mem::transmute::<usize, {fn_type}>(vtable_entry(call.native_this(), {slot}));"
            );
            self.finish_call(plan, "real", true);
        }
    }

    fn param_list(&self, plan: &ShimPlan, method: bool) -> String {
        let api = self.api();
        let mut params: Vec<String> = Vec::with_capacity(plan.args.len() + 1);
        if method {
            params.push(format!("this: *mut {VOID}"));
        }
        params.extend(
            plan.args
                .iter()
                .map(|a| format!("{}: {}", ident(&a.name), rust_type(api, &a.ty))),
        );
        params.join(", ")
    }

    fn fn_type(&self, plan: &ShimPlan, method: bool) -> String {
        let api = self.api();
        let mut params: Vec<String> = Vec::with_capacity(plan.args.len() + 1);
        if method {
            params.push(format!("*mut {VOID}"));
        }
        params.extend(plan.args.iter().map(|a| rust_type(api, &a.ty)));
        format!(
            "unsafe extern \"system\" fn({}){}",
            params.join(", "),
            ret_type(api, plan)
        )
    }

    fn begin_call(&mut self, plan: &ShimPlan, plan_expr: &str, this: &str) {
        let api = self.api();
        let words: Vec<String> = plan
            .args
            .iter()
            .map(|a| to_word(api, &a.ty, &ident(&a.name)))
            .collect();
        self.out.push_str("    let interceptor = interceptor();\n");
        let _ = writeln!(
            self.out,
            "    let mut call = interceptor.begin({plan_expr}, {this}, &[{}]);",
            words.join(", ")
        );
        for arg in &plan.args {
            size_comment(&mut self.out, arg);
        }
        self.out.push_str("    call.capture_pre();\n");
        if let Some(pre) = &plan.injection.pre {
            snippet_comment(&mut self.out, "pre", &pre.code);
            self.out.push_str("    call.inject_pre();\n");
        }
        self.out.push_str("    call.prepare();\n");
    }

    fn finish_call(&mut self, plan: &ShimPlan, real: &str, method: bool) {
        let api = self.api();
        let mut args: Vec<String> = Vec::with_capacity(plan.args.len() + 1);
        if method {
            args.push(format!("call.native_this() as *mut {VOID}"));
        }
        args.extend(
            plan.args
                .iter()
                .map(|a| from_word(api, Some(&a.ty), &format!("call.native_arg({})", a.index))),
        );
        let invocation = format!("{real}({})", args.join(", "));
        match &plan.ret {
            Some(ty) => {
                let _ = writeln!(self.out, "    let ret = {invocation};");
                let _ = writeln!(self.out, "    call.complete({});", to_word(api, ty, "ret"));
            }
            None => {
                let _ = writeln!(self.out, "    {invocation};");
                self.out.push_str("    call.complete(0);\n");
            }
        }
        if let Some(post) = &plan.injection.post {
            snippet_comment(&mut self.out, "post", &post.code);
            self.out.push_str("    call.inject_post();\n");
        }
        self.out.push_str("    call.capture_post();\n");
        match &plan.ret {
            Some(_) => {
                let _ = writeln!(
                    self.out,
                    "    {}",
                    from_word(api, plan.ret.as_ref(), "call.finish()")
                );
            }
            None => self.out.push_str("    call.finish();\n"),
        }
        self.out.push_str("}\n\n");
    }
}

/// Vtable field names. A method name repeated further down the chain gets its slot appended.
fn slot_names<'n>(methods: impl Iterator<Item = &'n str>) -> Vec<String> {
    let mut seen = HashSet::new();
    methods
        .enumerate()
        .map(|(slot, name)| {
            if seen.insert(name) {
                name.to_owned()
            } else {
                format!("{name}_{slot}")
            }
        })
        .collect()
}

fn size_comment(out: &mut String, arg: &ArgPlan) {
    if let Some(size) = &arg.size {
        let unit = match size.kind {
            calltrace_api::ExtentKind::Elements => "elements",
            _ => "bytes",
        };
        let when = if arg.captured_before() { "pre" } else { "post" };
        let _ = writeln!(out, "    // {}: {} {unit} ({when}-call)", arg.name, size.source);
    }
}

fn snippet_comment(out: &mut String, label: &str, code: &str) {
    let _ = writeln!(out, "    // {label}-call injection:");
    for line in code.lines() {
        let _ = writeln!(out, "    //     {line}");
    }
}

fn ret_type(api: &Api, plan: &ShimPlan) -> String {
    match &plan.ret {
        Some(ty) => format!(" -> {}", rust_type(api, ty)),
        None => String::new(),
    }
}

fn collect_aliases(api: &Api, ty: &Type, out: &mut BTreeMap<String, String>) {
    match ty {
        Type::Alias { name, target } => {
            out.entry(name.clone())
                .or_insert_with(|| rust_type(api, target));
            collect_aliases(api, target, out);
        }
        Type::Pointer { target, .. } => collect_aliases(api, target, out),
        Type::Array { element, .. } | Type::Blob { element, .. } => {
            collect_aliases(api, element, out)
        }
        _ => {}
    }
}

/// Rust spelling of a parameter or field type.
fn rust_type(api: &Api, ty: &Type) -> String {
    match ty {
        Type::Primitive(Primitive::Void) => "()".to_owned(),
        Type::Primitive(p) => p.rust_name().to_owned(),
        Type::String(StringKind::Narrow) => "*const ::core::ffi::c_char".to_owned(),
        Type::String(StringKind::Wide) => "*const u16".to_owned(),
        Type::Enum(name) | Type::Flags(name) | Type::Struct(name) => name.clone(),
        Type::Alias { name, .. } => name.clone(),
        Type::Object(_) => format!("*mut {VOID}"),
        Type::Pointer { target, is_const } => {
            let qualifier = if *is_const { "const" } else { "mut" };
            let pointee = match target.canonical() {
                Type::Primitive(Primitive::Void) | Type::Array { .. } | Type::Blob { .. } => {
                    VOID.to_owned()
                }
                _ => rust_type(api, target),
            };
            format!("*{qualifier} {pointee}")
        }
        Type::Array { element, .. } => format!("*const {}", rust_type(api, element)),
        Type::Blob { .. } => format!("*const {VOID}"),
    }
}

/// Widens a typed expression to a `u64` word.
fn to_word(api: &Api, ty: &Type, expr: &str) -> String {
    match scalar_prim(api, ty) {
        Some(Primitive::F32) => format!("{expr}.to_bits() as u64"),
        Some(Primitive::F64) => format!("{expr}.to_bits()"),
        Some(p) if p.is_signed() => format!("{expr} as i64 as u64"),
        Some(_) => format!("{expr} as u64"),
        None => format!("{expr} as usize as u64"),
    }
}

/// Narrows a word back to the declared type.
fn from_word(api: &Api, ty: Option<&Type>, expr: &str) -> String {
    let Some(ty) = ty else {
        return expr.to_owned();
    };
    let rust = rust_type(api, ty);
    match scalar_prim(api, ty) {
        Some(Primitive::F32) => format!("f32::from_bits({expr} as u32)"),
        Some(Primitive::F64) => format!("f64::from_bits({expr})"),
        Some(_) => format!("{expr} as {rust}"),
        None => format!("{expr} as usize as {rust}"),
    }
}

fn ident(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
        "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl",
        "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
        "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "typeof",
        "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
    ];
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_method_names_get_their_slot() {
        let names = slot_names(["QueryInterface", "GetDesc", "Map", "GetDesc"].into_iter());
        assert_eq!(names, vec!["QueryInterface", "GetDesc", "Map", "GetDesc_3"]);
    }

    #[test]
    fn reserved_words_become_raw_identifiers() {
        assert_eq!(ident("type"), "r#type");
        assert_eq!(ident("macro"), "r#macro");
        assert_eq!(ident("Type"), "Type");
    }
}
