use std::sync::Arc;

use calltrace_api::{
    Api, BoundSize, Direction, ExtentKind, Interface, RefEffect, ResolvedCallable, SizeHelpers,
    Type,
};
use calltrace_trace::ShadowField;
use thiserror::Error;

use crate::hooks::{ArgContext, ArgEncoding, Hooks, Injection};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    #[error("{callable}({param}): {reason}")]
    InvalidEncoding {
        callable: String,
        param: String,
        reason: &'static str,
    },
    #[error("{callable}({param}): struct `{ty}` cannot be passed by value")]
    ByValueStruct {
        callable: String,
        param: String,
        ty: String,
    },
    #[error("interface `{interface}` declares shadow field `{field}` twice")]
    DuplicateShadowField { interface: String, field: String },
}

/// How one parameter is captured.
#[derive(Debug, Clone)]
pub struct ArgPlan {
    pub index: usize,
    pub name: String,
    pub ty: Type,
    pub direction: Direction,
    pub size: Option<BoundSize>,
    pub encoding: ArgEncoding,
}

impl ArgPlan {
    pub fn captured_before(&self) -> bool {
        self.direction.reads_before()
    }

    pub fn captured_after(&self) -> bool {
        self.direction.reads_after()
    }
}

/// Everything a shim does for one function, or for one slot of one interface.
#[derive(Debug, Clone)]
pub struct ShimPlan {
    /// `Interface::Method` (concrete interface) or the function name.
    pub qualified_name: String,
    pub interface: Option<String>,
    pub slot: Option<usize>,
    pub callable: ResolvedCallable,
    pub args: Vec<ArgPlan>,
    pub ret: Option<Type>,
    pub injection: Injection,
    pub refcount: RefEffect,
    pub side_effects: bool,
    pub fail: Option<u64>,
}

impl ShimPlan {
    pub fn name(&self) -> &str {
        self.callable.name()
    }

    pub fn pre_call_args(&self) -> impl Iterator<Item = &ArgPlan> {
        self.args.iter().filter(|a| a.captured_before())
    }

    pub fn post_call_args(&self) -> impl Iterator<Item = &ArgPlan> {
        self.args.iter().filter(|a| a.captured_after())
    }

    pub fn arg(&self, name: &str) -> Option<&ArgPlan> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn is_method(&self) -> bool {
        self.interface.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct InterfacePlan {
    pub name: String,
    pub chain: Vec<String>,
    /// One plan per effective slot, in slot order.
    pub slots: Vec<Arc<ShimPlan>>,
    pub shadow: Vec<ShadowField>,
}

impl InterfacePlan {
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|p| p.name() == name)
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedApi {
    pub api: Arc<Api>,
    pub functions: Vec<Arc<ShimPlan>>,
    pub interfaces: Vec<InterfacePlan>,
    pub helpers: SizeHelpers,
}

impl GeneratedApi {
    pub fn function(&self, name: &str) -> Option<&Arc<ShimPlan>> {
        self.functions.iter().find(|f| f.name() == name)
    }

    pub fn interface(&self, name: &str) -> Option<&InterfacePlan> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn method(&self, interface: &str, method: &str) -> Option<&Arc<ShimPlan>> {
        let plan = self.interface(interface)?;
        plan.slots.iter().find(|p| p.name() == method)
    }

    pub fn shadow_for(&self, interface: Option<&str>) -> &[ShadowField] {
        interface
            .and_then(|name| self.interface(name))
            .map_or(&[], |plan| plan.shadow.as_slice())
    }

    pub fn shim_count(&self) -> usize {
        self.functions.len() + self.interfaces.iter().map(|i| i.slots.len()).sum::<usize>()
    }
}

/// Turns resolved tables plus hooks into shim plans.
pub struct Generator<'a> {
    api: &'a Api,
    hooks: &'a Hooks,
}

impl<'a> Generator<'a> {
    pub fn new(api: &'a Api, hooks: &'a Hooks) -> Self {
        Self { api, hooks }
    }

    pub fn generate(&self) -> Result<GeneratedApi, GenError> {
        let mut functions = Vec::new();
        for function in self.api.functions() {
            if !(self.hooks.is_visible)(function) {
                tracing::debug!(function = function.name(), "not visible, skipped");
                continue;
            }
            functions.push(Arc::new(self.plan(None, None, function)?));
        }

        let mut interfaces = Vec::with_capacity(self.api.interfaces().len());
        for interface in self.api.interfaces() {
            let shadow = (self.hooks.wrapper_state)(interface);
            for (i, field) in shadow.iter().enumerate() {
                if shadow[..i].iter().any(|f| f.name == field.name) {
                    return Err(GenError::DuplicateShadowField {
                        interface: interface.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            let mut slots = Vec::with_capacity(interface.slots.len());
            for (slot, method) in interface.slots.iter().enumerate() {
                slots.push(Arc::new(self.plan(Some(interface), Some(slot), method)?));
            }
            interfaces.push(InterfacePlan {
                name: interface.name.clone(),
                chain: interface.chain.clone(),
                slots,
                shadow,
            });
        }

        let generated = GeneratedApi {
            api: Arc::new(self.api.clone()),
            functions,
            interfaces,
            helpers: self.hooks.helpers.clone(),
        };
        tracing::debug!(
            api = self.api.name(),
            shims = generated.shim_count(),
            "generated shim plans"
        );
        Ok(generated)
    }

    fn plan(
        &self,
        interface: Option<&Interface>,
        slot: Option<usize>,
        callable: &ResolvedCallable,
    ) -> Result<ShimPlan, GenError> {
        let qualified_name = match interface {
            Some(interface) => format!("{}::{}", interface.name, callable.name()),
            None => callable.name().to_owned(),
        };
        let mut args = Vec::with_capacity(callable.params.len());
        for (index, param) in callable.params.iter().enumerate() {
            let ctx = ArgContext {
                api: self.api,
                interface,
                callable,
                param,
                index,
            };
            let encoding = (self.hooks.serialize_arg)(&ctx);
            self.check_param(&qualified_name, param, &encoding)?;
            if let ArgEncoding::ObjectFromIid { riid } = &encoding {
                if *riid >= callable.params.len() || param.param.direction == Direction::In {
                    return Err(GenError::InvalidEncoding {
                        callable: qualified_name,
                        param: param.param.name.clone(),
                        reason: "IID lookup needs an output parameter and an IID parameter",
                    });
                }
            }
            args.push(ArgPlan {
                index,
                name: param.param.name.clone(),
                ty: param.param.ty.clone(),
                direction: param.param.direction,
                size: param.size.clone(),
                encoding,
            });
        }
        let ret = callable.callable.returns_value().then(|| callable.callable.ret.clone());
        if let Some(Type::Struct(name)) = ret.as_ref().map(Type::canonical) {
            return Err(GenError::ByValueStruct {
                callable: qualified_name,
                param: "return".into(),
                ty: name.clone(),
            });
        }
        Ok(ShimPlan {
            injection: (self.hooks.inject)(interface, callable),
            qualified_name,
            interface: interface.map(|i| i.name.clone()),
            slot,
            callable: callable.clone(),
            args,
            ret,
            refcount: callable.callable.refcount,
            side_effects: callable.callable.side_effects,
            fail: callable.callable.fail,
        })
    }

    fn check_param(
        &self,
        callable: &str,
        param: &calltrace_api::BoundParam,
        encoding: &ArgEncoding,
    ) -> Result<(), GenError> {
        if let Type::Struct(name) = param.param.ty.canonical() {
            return Err(GenError::ByValueStruct {
                callable: callable.to_owned(),
                param: param.param.name.clone(),
                ty: name.clone(),
            });
        }
        if let ArgEncoding::ShaderText(_) = encoding {
            let is_blob = matches!(
                param.size.as_ref().map(|s| s.kind),
                Some(ExtentKind::Bytes | ExtentKind::Opaque)
            );
            if !is_blob {
                return Err(GenError::InvalidEncoding {
                    callable: callable.to_owned(),
                    param: param.param.name.clone(),
                    reason: "shader text needs a sized blob parameter",
                });
            }
        }
        Ok(())
    }
}
