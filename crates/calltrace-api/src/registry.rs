//! API tables: an [`ApiBuilder`] collects declarations, [`ApiBuilder::resolve`] validates them and
//! freezes an immutable [`Api`].

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::callable::{Callable, Direction, Param};
use crate::size::{self, Binder, BoundSize, ExtentKind, Phase, SizeExprError, Sibling, TypeEnv};
use crate::types::{
    align_up, EnumDef, Field, FlagsDef, Guid, Layout, NameRef, Primitive, StructDef, Type,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("`{name}` is declared more than once in API `{api}`")]
    DuplicateName { api: String, name: String },
    #[error("`{container}` declares member `{name}` more than once")]
    DuplicateMember { container: String, name: String },
    #[error("{context}: unknown {kind} `{name}`")]
    UnknownType {
        context: String,
        kind: &'static str,
        name: String,
    },
    #[error("cannot extend unknown {kind} `{name}`")]
    ExtendMissing { kind: &'static str, name: String },
    #[error("interface `{interface}` derives from unknown interface `{parent}`")]
    UnknownParent { interface: String, parent: String },
    #[error("interface inheritance cycle through `{0}`")]
    InheritanceCycle(String),
    #[error("interface `{interface}`: malformed IID `{text}`")]
    InvalidIid { interface: String, text: String },
    #[error("struct `{0}` contains itself by value")]
    RecursiveStruct(String),
    #[error("{context}: size expression `{source_text}`: {error}")]
    SizeExpr {
        context: String,
        source_text: String,
        #[source]
        error: SizeExprError,
    },
}

#[derive(Debug, Clone)]
struct InterfaceDecl {
    name: String,
    parent: Option<String>,
    iid: Option<Guid>,
    methods: Vec<Callable>,
}

/// Mutable collection of declarations. Methods chain; declaration errors are kept and reported
/// by [`ApiBuilder::resolve`].
#[derive(Debug, Clone)]
pub struct ApiBuilder {
    name: String,
    enums: Vec<EnumDef>,
    flags: Vec<FlagsDef>,
    structs: Vec<StructDef>,
    interfaces: Vec<InterfaceDecl>,
    functions: Vec<Callable>,
    constants: Vec<(String, u64)>,
    helpers: Vec<(String, usize)>,
    errors: Vec<ApiError>,
}

impl ApiBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            enums: Vec::new(),
            flags: Vec::new(),
            structs: Vec::new(),
            interfaces: Vec::new(),
            functions: Vec::new(),
            constants: Vec::new(),
            helpers: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.enums
            .iter()
            .map(|e| e.name.as_str())
            .chain(self.flags.iter().map(|f| f.name.as_str()))
            .chain(self.structs.iter().map(|s| s.name.as_str()))
            .chain(self.interfaces.iter().map(|i| i.name.as_str()))
            .chain(self.functions.iter().map(|f| f.name.as_str()))
            .chain(self.constants.iter().map(|(n, _)| n.as_str()))
            .chain(self.helpers.iter().map(|(n, _)| n.as_str()))
    }

    fn declares(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    fn claim(&mut self, name: &str) -> bool {
        if self.declares(name) {
            self.errors.push(ApiError::DuplicateName {
                api: self.name.clone(),
                name: name.to_owned(),
            });
            return false;
        }
        true
    }

    pub fn enumeration(&mut self, def: EnumDef) -> &mut Self {
        if self.claim(&def.name) {
            self.enums.push(def);
        }
        self
    }

    pub fn flags(&mut self, def: FlagsDef) -> &mut Self {
        if self.claim(&def.name) {
            self.flags.push(def);
        }
        self
    }

    pub fn structure(&mut self, def: StructDef) -> &mut Self {
        if self.claim(&def.name) {
            self.structs.push(def);
        }
        self
    }

    pub fn opaque_struct(&mut self, name: &str) -> &mut Self {
        self.structure(StructDef::opaque(name))
    }

    pub fn interface(&mut self, name: &str, parent: Option<&str>) -> &mut Self {
        if self.claim(name) {
            self.interfaces.push(InterfaceDecl {
                name: name.to_owned(),
                parent: parent.map(str::to_owned),
                iid: None,
                methods: Vec::new(),
            });
        }
        self
    }

    /// Records the IID an interface is requested by through `QueryInterface`.
    pub fn iid(&mut self, interface: &str, text: &str) -> &mut Self {
        let Some(guid) = Guid::parse(text) else {
            self.errors.push(ApiError::InvalidIid {
                interface: interface.to_owned(),
                text: text.to_owned(),
            });
            return self;
        };
        match self.interfaces.iter_mut().find(|i| i.name == interface) {
            Some(decl) => decl.iid = Some(guid),
            None => self.errors.push(ApiError::ExtendMissing {
                kind: "interface",
                name: interface.to_owned(),
            }),
        }
        self
    }

    /// Appends methods to an interface's own method list.
    pub fn methods(&mut self, interface: &str, methods: Vec<Callable>) -> &mut Self {
        match self.interfaces.iter_mut().find(|i| i.name == interface) {
            Some(decl) => decl.methods.extend(methods),
            None => self.errors.push(ApiError::ExtendMissing {
                kind: "interface",
                name: interface.to_owned(),
            }),
        }
        self
    }

    pub fn function(&mut self, callable: Callable) -> &mut Self {
        if self.claim(&callable.name) {
            self.functions.push(callable);
        }
        self
    }

    pub fn functions(&mut self, callables: Vec<Callable>) -> &mut Self {
        for callable in callables {
            self.function(callable);
        }
        self
    }

    pub fn constant(&mut self, name: &str, value: u64) -> &mut Self {
        if self.claim(name) {
            self.constants.push((name.to_owned(), value));
        }
        self
    }

    /// Declares a size helper usable as `name(args)` in size expressions.
    pub fn helper(&mut self, name: &str, arity: usize) -> &mut Self {
        if self.claim(name) {
            self.helpers.push((name.to_owned(), arity));
        }
        self
    }

    /// Appends values to an existing enum. Earlier values keep their position and value.
    pub fn extend_enum(&mut self, name: &str, values: &[(&str, Option<i64>)]) -> &mut Self {
        let Some(def) = self.enums.iter_mut().find(|e| e.name == name) else {
            self.errors.push(ApiError::ExtendMissing {
                kind: "enum",
                name: name.to_owned(),
            });
            return self;
        };
        let mut duplicates = Vec::new();
        for (value_name, value) in values {
            if def.contains(value_name) {
                duplicates.push(*value_name);
                continue;
            }
            def.push(value_name, *value);
        }
        for dup in duplicates {
            self.errors.push(ApiError::DuplicateMember {
                container: name.to_owned(),
                name: dup.to_owned(),
            });
        }
        self
    }

    pub fn extend_flags(&mut self, name: &str, values: &[(&str, Option<u64>)]) -> &mut Self {
        let Some(def) = self.flags.iter_mut().find(|f| f.name == name) else {
            self.errors.push(ApiError::ExtendMissing {
                kind: "flags",
                name: name.to_owned(),
            });
            return self;
        };
        let mut duplicates = Vec::new();
        for (bit_name, value) in values {
            if def.contains(bit_name) {
                duplicates.push(*bit_name);
                continue;
            }
            def.push(bit_name, *value);
        }
        for dup in duplicates {
            self.errors.push(ApiError::DuplicateMember {
                container: name.to_owned(),
                name: dup.to_owned(),
            });
        }
        self
    }

    /// In-place union with another API. Fails on the first name both declare.
    pub fn merge(&mut self, other: ApiBuilder) -> Result<&mut Self, ApiError> {
        if let Some(dup) = other.names().find(|n| self.declares(n)) {
            return Err(ApiError::DuplicateName {
                api: format!("{}+{}", self.name, other.name),
                name: dup.to_owned(),
            });
        }
        let ApiBuilder {
            enums,
            flags,
            structs,
            interfaces,
            functions,
            constants,
            helpers,
            errors,
            ..
        } = other;
        self.enums.extend(enums);
        self.flags.extend(flags);
        self.structs.extend(structs);
        self.interfaces.extend(interfaces);
        self.functions.extend(functions);
        self.constants.extend(constants);
        self.helpers.extend(helpers);
        self.errors.extend(errors);
        Ok(self)
    }

    /// Validates every declaration and freezes the tables.
    pub fn resolve(&self) -> Result<Api, ApiError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }
        self.check_members()?;
        self.check_references()?;
        let chains = self.interface_chains()?;

        let mut layouts = HashMap::new();
        for def in &self.structs {
            if !def.opaque {
                self.struct_layout(&def.name, &mut layouts, &mut Vec::new())?;
            }
        }

        let env = ResolveEnv {
            builder: self,
            layouts: &layouts,
        };

        let mut structs = Vec::with_capacity(self.structs.len());
        for def in &self.structs {
            structs.push(env.resolve_struct(def)?);
        }

        let mut functions = Vec::with_capacity(self.functions.len());
        for callable in &self.functions {
            functions.push(env.resolve_callable(callable, None)?);
        }

        let mut own: HashMap<&str, Vec<ResolvedCallable>> = HashMap::new();
        for decl in &self.interfaces {
            let mut methods = Vec::with_capacity(decl.methods.len());
            for method in &decl.methods {
                methods.push(env.resolve_callable(method, Some(&decl.name))?);
            }
            own.insert(decl.name.as_str(), methods);
        }

        let mut interfaces = Vec::with_capacity(self.interfaces.len());
        for decl in &self.interfaces {
            let chain = chains[decl.name.as_str()].clone();
            let mut slots = Vec::new();
            let mut own_start = 0;
            for level in &chain {
                if level == &decl.name {
                    own_start = slots.len();
                }
                slots.extend(own[level.as_str()].iter().cloned());
            }
            interfaces.push(Interface {
                name: decl.name.clone(),
                parent: decl.parent.clone(),
                iid: decl.iid,
                chain,
                slots,
                own_start,
            });
        }

        let api = Api {
            name: self.name.clone(),
            enums: self.enums.clone(),
            flags: self.flags.clone(),
            structs,
            interfaces,
            functions,
            constants: self.constants.iter().cloned().collect(),
            helpers: self.helpers.iter().cloned().collect(),
        };
        tracing::debug!(
            api = %api.name,
            functions = api.functions.len(),
            interfaces = api.interfaces.len(),
            structs = api.structs.len(),
            "resolved API"
        );
        Ok(api)
    }

    fn check_members(&self) -> Result<(), ApiError> {
        fn unique<'a>(
            container: &str,
            names: impl Iterator<Item = &'a str>,
        ) -> Result<(), ApiError> {
            let mut seen = HashSet::new();
            for name in names {
                if !seen.insert(name) {
                    return Err(ApiError::DuplicateMember {
                        container: container.to_owned(),
                        name: name.to_owned(),
                    });
                }
            }
            Ok(())
        }

        for def in &self.enums {
            unique(&def.name, def.values.iter().map(|v| v.name.as_str()))?;
        }
        for def in &self.flags {
            unique(&def.name, def.bits.iter().map(|b| b.name.as_str()))?;
        }
        for def in &self.structs {
            unique(&def.name, def.fields.iter().map(|f| f.name.as_str()))?;
        }
        for decl in &self.interfaces {
            unique(&decl.name, decl.methods.iter().map(|m| m.name.as_str()))?;
            for method in &decl.methods {
                unique(
                    &format!("{}::{}", decl.name, method.name),
                    method.arg_names(),
                )?;
            }
        }
        for function in &self.functions {
            unique(&function.name, function.arg_names())?;
        }
        Ok(())
    }

    fn check_type(&self, context: &str, ty: &Type) -> Result<(), ApiError> {
        let mut missing = None;
        ty.for_each_name(&mut |name| {
            if missing.is_some() {
                return;
            }
            let (kind, found) = match name {
                NameRef::Enum(n) => ("enum", self.enums.iter().any(|e| e.name == n)),
                NameRef::Flags(n) => ("flags", self.flags.iter().any(|f| f.name == n)),
                NameRef::Struct(n) => ("struct", self.structs.iter().any(|s| s.name == n)),
                NameRef::Interface(n) => {
                    ("interface", self.interfaces.iter().any(|i| i.name == n))
                }
            };
            if !found {
                let (NameRef::Enum(n) | NameRef::Flags(n) | NameRef::Struct(n)
                | NameRef::Interface(n)) = name;
                missing = Some((kind, n.to_owned()));
            }
        });
        match missing {
            Some((kind, name)) => Err(ApiError::UnknownType {
                context: context.to_owned(),
                kind,
                name,
            }),
            None => Ok(()),
        }
    }

    fn check_callable(&self, owner: Option<&str>, callable: &Callable) -> Result<(), ApiError> {
        let context = qualified(owner, &callable.name);
        self.check_type(&context, &callable.ret)?;
        for param in &callable.params {
            self.check_type(&format!("{context}({})", param.name), &param.ty)?;
        }
        Ok(())
    }

    fn check_references(&self) -> Result<(), ApiError> {
        for def in &self.structs {
            for field in &def.fields {
                self.check_type(&format!("{}.{}", def.name, field.name), &field.ty)?;
            }
        }
        for function in &self.functions {
            self.check_callable(None, function)?;
        }
        for decl in &self.interfaces {
            for method in &decl.methods {
                self.check_callable(Some(&decl.name), method)?;
            }
        }
        Ok(())
    }

    /// Root-first inheritance chain of every interface.
    fn interface_chains(&self) -> Result<HashMap<&str, Vec<String>>, ApiError> {
        let by_name: HashMap<&str, &InterfaceDecl> = self
            .interfaces
            .iter()
            .map(|i| (i.name.as_str(), i))
            .collect();
        let mut chains = HashMap::new();
        for decl in &self.interfaces {
            let mut chain = vec![decl.name.clone()];
            let mut current = decl;
            while let Some(parent) = &current.parent {
                let Some(next) = by_name.get(parent.as_str()) else {
                    return Err(ApiError::UnknownParent {
                        interface: current.name.clone(),
                        parent: parent.clone(),
                    });
                };
                if chain.iter().any(|c| c == &next.name) {
                    return Err(ApiError::InheritanceCycle(next.name.clone()));
                }
                chain.push(next.name.clone());
                current = next;
            }
            chain.reverse();
            chains.insert(decl.name.as_str(), chain);
        }
        Ok(chains)
    }

    fn struct_layout(
        &self,
        name: &str,
        memo: &mut HashMap<String, Layout>,
        stack: &mut Vec<String>,
    ) -> Result<Option<Layout>, ApiError> {
        if let Some(layout) = memo.get(name) {
            return Ok(Some(*layout));
        }
        let Some(def) = self.structs.iter().find(|s| s.name == name) else {
            return Ok(None);
        };
        if def.opaque {
            return Ok(None);
        }
        if stack.iter().any(|s| s == name) {
            return Err(ApiError::RecursiveStruct(name.to_owned()));
        }
        stack.push(name.to_owned());
        let mut offset = 0;
        let mut align = 1;
        for field in &def.fields {
            let context = format!("{}.{}", def.name, field.name);
            let Some(layout) = self.value_layout(&context, &field.ty, memo, stack)? else {
                return Err(ApiError::UnknownType {
                    context,
                    kind: "by-value struct",
                    name: field.ty.to_string(),
                });
            };
            offset = align_up(offset, layout.align) + layout.size;
            align = align.max(layout.align);
        }
        stack.pop();
        let layout = Layout {
            size: align_up(offset, align),
            align,
        };
        memo.insert(name.to_owned(), layout);
        Ok(Some(layout))
    }

    /// Layout of a value stored in native memory (struct field or array element).
    fn value_layout(
        &self,
        context: &str,
        ty: &Type,
        memo: &mut HashMap<String, Layout>,
        stack: &mut Vec<String>,
    ) -> Result<Option<Layout>, ApiError> {
        Ok(match ty {
            Type::Primitive(p) => Some(Layout::of_primitive(*p)),
            Type::String(_) | Type::Pointer { .. } | Type::Object(_) | Type::Blob { .. } => {
                Some(Layout::POINTER)
            }
            Type::Enum(name) => self
                .enums
                .iter()
                .find(|e| &e.name == name)
                .map(|e| Layout::of_primitive(e.repr)),
            Type::Flags(name) => self
                .flags
                .iter()
                .find(|f| &f.name == name)
                .map(|f| Layout::of_primitive(f.repr)),
            Type::Struct(name) => self.struct_layout(name, memo, stack)?,
            Type::Alias { target, .. } => self.value_layout(context, target, memo, stack)?,
            Type::Array { element, count } => {
                let inline = {
                    let env = ResolveEnv {
                        builder: self,
                        layouts: memo,
                    };
                    env.constant_count(context, count.as_str())?
                };
                match inline {
                    Some(n) => self
                        .value_layout(context, element, memo, stack)?
                        .map(|elem| Layout {
                            size: elem.size * n as usize,
                            align: elem.align,
                        }),
                    None => Some(Layout::POINTER),
                }
            }
        })
    }
}

fn qualified(owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) => format!("{owner}::{name}"),
        None => name.to_owned(),
    }
}

struct ResolveEnv<'a> {
    builder: &'a ApiBuilder,
    layouts: &'a HashMap<String, Layout>,
}

impl TypeEnv for ResolveEnv<'_> {
    fn constant(&self, name: &str) -> Option<u64> {
        let b = self.builder;
        b.constants
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .or_else(|| b.enums.iter().find_map(|e| e.value_of(name).map(|v| v as u64)))
            .or_else(|| b.flags.iter().find_map(|f| f.value_of(name)))
    }

    fn helper_arity(&self, name: &str) -> Option<usize> {
        self.builder
            .helpers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, arity)| *arity)
    }

    fn scalar(&self, ty: &Type) -> Option<Primitive> {
        scalar_of(ty, &self.builder.enums, &self.builder.flags)
    }

    fn field(&self, structure: &str, field: &str) -> Option<(usize, Type)> {
        let def = self.builder.structs.iter().find(|s| s.name == structure)?;
        if def.opaque {
            return None;
        }
        let offsets = self.field_offsets(def)?;
        let index = def.fields.iter().position(|f| f.name == field)?;
        Some((offsets[index], def.fields[index].ty.clone()))
    }

    fn size_of_named(&self, name: &str) -> Option<usize> {
        if let Some(layout) = self.layouts.get(name) {
            return Some(layout.size);
        }
        let b = self.builder;
        b.enums
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.repr.size())
            .or_else(|| b.flags.iter().find(|f| f.name == name).map(|f| f.repr.size()))
    }
}

fn scalar_of(ty: &Type, enums: &[EnumDef], flags: &[FlagsDef]) -> Option<Primitive> {
    match ty.canonical() {
        Type::Primitive(p) if p.is_integer() => Some(*p),
        Type::Enum(name) => enums.iter().find(|e| &e.name == name).map(|e| e.repr),
        Type::Flags(name) => flags.iter().find(|f| &f.name == name).map(|f| f.repr),
        _ => None,
    }
}

impl ResolveEnv<'_> {
    /// Count of an inline array, when the expression is a constant.
    fn constant_count(&self, context: &str, source: &str) -> Result<Option<u64>, ApiError> {
        let expr = size::parse(source).map_err(|error| ApiError::SizeExpr {
            context: context.to_owned(),
            source_text: source.to_owned(),
            error,
        })?;
        let binder = Binder {
            siblings: &[],
            env: self,
            phase: Phase::PostCall,
        };
        Ok(binder.bind(&expr).ok().and_then(|b| b.as_const()))
    }

    fn value_layout(&self, ty: &Type) -> Option<Layout> {
        Api::layout_with(ty, &|name| self.layouts.get(name).copied(), self)
    }

    fn field_offsets(&self, def: &StructDef) -> Option<Vec<usize>> {
        let mut offsets = Vec::with_capacity(def.fields.len());
        let mut offset = 0;
        for field in &def.fields {
            let layout = self.value_layout(&field.ty)?;
            offset = align_up(offset, layout.align);
            offsets.push(offset);
            offset += layout.size;
        }
        Some(offsets)
    }

    fn bind_size(
        &self,
        context: &str,
        ty: &Type,
        siblings: &[Sibling<'_>],
        direction: Direction,
    ) -> Result<Option<BoundSize>, ApiError> {
        let (source, kind) = match extent_of(ty) {
            Some(found) => found,
            None => return Ok(None),
        };
        let wrap = |error| ApiError::SizeExpr {
            context: context.to_owned(),
            source_text: source.to_owned(),
            error,
        };
        let expr = size::parse(source).map_err(wrap)?;
        let phase = if direction.reads_before() {
            Phase::PreCall
        } else {
            Phase::PostCall
        };
        let binder = Binder {
            siblings,
            env: self,
            phase,
        };
        let bound = binder.bind(&expr).map_err(wrap)?;
        Ok(Some(BoundSize {
            source: source.to_owned(),
            expr: bound,
            kind,
            pre_call: direction.reads_before(),
            post_call: direction.reads_after(),
        }))
    }

    fn resolve_struct(&self, def: &StructDef) -> Result<ResolvedStruct, ApiError> {
        if def.opaque {
            return Ok(ResolvedStruct {
                name: def.name.clone(),
                opaque: true,
                layout: None,
                fields: Vec::new(),
            });
        }
        let layout = self.layouts.get(&def.name).copied();
        let offsets = self.field_offsets(def).unwrap_or_default();
        let siblings: Vec<Sibling<'_>> = def
            .fields
            .iter()
            .map(|f| Sibling {
                name: &f.name,
                ty: &f.ty,
                direction: Direction::In,
            })
            .collect();
        let mut fields = Vec::with_capacity(def.fields.len());
        for (index, field) in def.fields.iter().enumerate() {
            let context = format!("{}.{}", def.name, field.name);
            let inline_count = match field.ty.canonical() {
                Type::Array { count, .. } => self.constant_count(&context, count.as_str())?,
                _ => None,
            };
            let size = if inline_count.is_some() {
                None
            } else {
                self.bind_size(&context, &field.ty, &siblings, Direction::In)?
            };
            fields.push(ResolvedField {
                field: field.clone(),
                offset: offsets.get(index).copied().unwrap_or(0),
                inline_count,
                size,
            });
        }
        Ok(ResolvedStruct {
            name: def.name.clone(),
            opaque: false,
            layout,
            fields,
        })
    }

    fn resolve_callable(
        &self,
        callable: &Callable,
        owner: Option<&str>,
    ) -> Result<ResolvedCallable, ApiError> {
        let siblings: Vec<Sibling<'_>> = callable
            .params
            .iter()
            .map(|p| Sibling {
                name: &p.name,
                ty: &p.ty,
                direction: p.direction,
            })
            .collect();
        let context = qualified(owner, &callable.name);
        let mut params = Vec::with_capacity(callable.params.len());
        for param in &callable.params {
            let size = self.bind_size(
                &format!("{context}({})", param.name),
                &param.ty,
                &siblings,
                param.direction,
            )?;
            params.push(BoundParam {
                param: param.clone(),
                size,
            });
        }
        Ok(ResolvedCallable {
            callable: callable.clone(),
            params,
            owner: owner.map(str::to_owned),
        })
    }
}

/// First array/blob extent reachable through pointers and aliases.
fn extent_of(ty: &Type) -> Option<(&str, ExtentKind)> {
    match ty {
        Type::Array { count, .. } => Some((count.as_str(), ExtentKind::Elements)),
        Type::Blob { size, opaque, .. } => Some((
            size.as_str(),
            if *opaque {
                ExtentKind::Opaque
            } else {
                ExtentKind::Bytes
            },
        )),
        Type::Pointer { target, .. } | Type::Alias { target, .. } => extent_of(target),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub param: Param,
    pub size: Option<BoundSize>,
}

impl BoundParam {
    pub fn name(&self) -> &str {
        &self.param.name
    }
}

/// A callable whose size expressions are bound to its own parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCallable {
    pub callable: Callable,
    pub params: Vec<BoundParam>,
    /// Interface that declares the method; `None` for free functions.
    pub owner: Option<String>,
}

impl ResolvedCallable {
    pub fn name(&self) -> &str {
        &self.callable.name
    }

    pub fn is_method(&self) -> bool {
        self.owner.is_some()
    }

    pub fn qualified_name(&self) -> String {
        qualified(self.owner.as_deref(), &self.callable.name)
    }

    pub fn param(&self, name: &str) -> Option<&BoundParam> {
        self.params.iter().find(|p| p.param.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub field: Field,
    pub offset: usize,
    /// Element count of an array stored inline in the struct.
    pub inline_count: Option<u64>,
    /// Extent of a pointer field, bound against the sibling fields.
    pub size: Option<BoundSize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStruct {
    pub name: String,
    pub opaque: bool,
    pub layout: Option<Layout>,
    pub fields: Vec<ResolvedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub parent: Option<String>,
    pub iid: Option<Guid>,
    /// Root first, ending with this interface.
    pub chain: Vec<String>,
    /// Effective method order: inherited slots followed by own methods.
    pub slots: Vec<ResolvedCallable>,
    own_start: usize,
}

impl Interface {
    /// Methods declared by this interface itself.
    pub fn methods(&self) -> &[ResolvedCallable] {
        &self.slots[self.own_start..]
    }

    pub fn slot_of(&self, method: &str) -> Option<usize> {
        self.slots.iter().position(|m| m.callable.name == method)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.slot_of(method).is_some()
    }
}

/// Frozen, validated API tables.
#[derive(Debug, Clone)]
pub struct Api {
    name: String,
    enums: Vec<EnumDef>,
    flags: Vec<FlagsDef>,
    structs: Vec<ResolvedStruct>,
    interfaces: Vec<Interface>,
    functions: Vec<ResolvedCallable>,
    constants: BTreeMap<String, u64>,
    helpers: BTreeMap<String, usize>,
}

impl Api {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &[ResolvedCallable] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&ResolvedCallable> {
        self.functions.iter().find(|f| f.callable.name == name)
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn interface_by_iid(&self, iid: &Guid) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.iid.as_ref() == Some(iid))
    }

    pub fn enums(&self) -> &[EnumDef] {
        &self.enums
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn all_flags(&self) -> &[FlagsDef] {
        &self.flags
    }

    pub fn flags(&self, name: &str) -> Option<&FlagsDef> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn structs(&self) -> &[ResolvedStruct] {
        &self.structs
    }

    pub fn structure(&self, name: &str) -> Option<&ResolvedStruct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<u64> {
        self.constants.get(name).copied()
    }

    pub fn helpers(&self) -> impl Iterator<Item = (&str, usize)> {
        self.helpers.iter().map(|(n, a)| (n.as_str(), *a))
    }

    /// Integer scalar behind a primitive, enum or flags type.
    pub fn scalar(&self, ty: &Type) -> Option<Primitive> {
        scalar_of(ty, &self.enums, &self.flags)
    }

    /// Layout of a value stored in native memory. Arrays with a constant count are inline;
    /// every other array is a pointer. Opaque structs have no layout.
    pub fn layout(&self, ty: &Type) -> Option<Layout> {
        let env = ApiEnv(self);
        Self::layout_with(
            ty,
            &|name| self.structure(name).and_then(|s| s.layout),
            &env,
        )
    }

    fn layout_with(
        ty: &Type,
        structs: &dyn Fn(&str) -> Option<Layout>,
        env: &dyn TypeEnv,
    ) -> Option<Layout> {
        match ty {
            Type::Primitive(p) => Some(Layout::of_primitive(*p)),
            Type::String(_) | Type::Pointer { .. } | Type::Object(_) | Type::Blob { .. } => {
                Some(Layout::POINTER)
            }
            Type::Enum(_) | Type::Flags(_) => env.scalar(ty).map(Layout::of_primitive),
            Type::Struct(name) => structs(name),
            Type::Alias { target, .. } => Self::layout_with(target, structs, env),
            Type::Array { element, count } => {
                let constant = size::parse(count.as_str()).ok().and_then(|expr| {
                    let binder = Binder {
                        siblings: &[],
                        env,
                        phase: Phase::PostCall,
                    };
                    binder.bind(&expr).ok().and_then(|b| b.as_const())
                });
                match constant {
                    Some(n) => {
                        let elem = Self::layout_with(element, structs, env)?;
                        Some(Layout {
                            size: elem.size * n as usize,
                            align: elem.align,
                        })
                    }
                    None => Some(Layout::POINTER),
                }
            }
        }
    }

    /// Whether `derived` is `base` or inherits from it.
    pub fn is_derived_from(&self, derived: &str, base: &str) -> bool {
        self.interface(derived)
            .is_some_and(|i| i.chain.iter().any(|c| c == base))
    }
}

struct ApiEnv<'a>(&'a Api);

impl TypeEnv for ApiEnv<'_> {
    fn constant(&self, name: &str) -> Option<u64> {
        let api = self.0;
        api.constant(name)
            .or_else(|| api.enums.iter().find_map(|e| e.value_of(name).map(|v| v as u64)))
            .or_else(|| api.flags.iter().find_map(|f| f.value_of(name)))
    }

    fn helper_arity(&self, name: &str) -> Option<usize> {
        self.0.helpers.get(name).copied()
    }

    fn scalar(&self, ty: &Type) -> Option<Primitive> {
        self.0.scalar(ty)
    }

    fn field(&self, structure: &str, field: &str) -> Option<(usize, Type)> {
        let def = self.0.structure(structure)?;
        def.fields
            .iter()
            .find(|f| f.field.name == field)
            .map(|f| (f.offset, f.field.ty.clone()))
    }

    fn size_of_named(&self, name: &str) -> Option<usize> {
        self.0
            .structure(name)
            .and_then(|s| s.layout)
            .map(|l| l.size)
            .or_else(|| self.0.enumeration(name).map(|e| e.repr.size()))
            .or_else(|| self.0.flags(name).map(|f| f.repr.size()))
    }
}
