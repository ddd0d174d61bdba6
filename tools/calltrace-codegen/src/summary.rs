//! Machine-readable description of a generated API, written next to the shim source.

use calltrace_api::Direction;
use calltrace_gen::{GeneratedApi, ShimPlan};
use serde::Serialize;

pub const SUMMARY_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub version: u32,
    pub api: String,
    pub shim_count: usize,
    pub functions: Vec<Shim>,
    pub interfaces: Vec<InterfaceSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceSummary {
    pub name: String,
    /// Root first, this interface last.
    pub chain: Vec<String>,
    pub slots: Vec<Shim>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shim {
    pub name: String,
    pub params: Vec<ParamSummary>,
    pub side_effects: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub injected: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ParamSummary {
    pub name: String,
    pub direction: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

fn direction(d: Direction) -> &'static str {
    match d {
        Direction::In => "in",
        Direction::Out => "out",
        Direction::InOut => "inout",
    }
}

fn shim(plan: &ShimPlan) -> Shim {
    let mut injected = Vec::new();
    if plan.injection.pre.is_some() {
        injected.push("pre");
    }
    if plan.injection.post.is_some() {
        injected.push("post");
    }
    Shim {
        name: plan.name().to_owned(),
        params: plan
            .args
            .iter()
            .map(|arg| ParamSummary {
                name: arg.name.clone(),
                direction: direction(arg.direction),
                size: arg.ty.size_spec().map(|s| s.as_str().to_owned()),
            })
            .collect(),
        side_effects: plan.side_effects,
        fail: plan.fail,
        injected,
    }
}

impl Summary {
    pub fn new(generated: &GeneratedApi) -> Self {
        Self {
            version: SUMMARY_VERSION,
            api: generated.api.name().to_owned(),
            shim_count: generated.shim_count(),
            functions: generated.functions.iter().map(|p| shim(p)).collect(),
            interfaces: generated
                .interfaces
                .iter()
                .map(|i| InterfaceSummary {
                    name: i.name.clone(),
                    chain: i.chain.clone(),
                    slots: i.slots.iter().map(|p| shim(p)).collect(),
                })
                .collect(),
        }
    }
}
