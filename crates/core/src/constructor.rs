//! Constructor argument coercion and creation payloads.

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};
use anyhow::{Context, Result};
use serde_json::Value;

use crate::CompiledArtifact;

/// The constructor parameters declared by `abi`, empty when there is no constructor.
pub fn constructor_inputs(abi: &JsonAbi) -> &[Param] {
    abi.constructor()
        .map(|constructor| constructor.inputs.as_slice())
        .unwrap_or(&[])
}

/// Render profile argument values as text for type coercion.
///
/// Strings are taken verbatim, everything else uses its JSON form. Numbers that are not
/// exact 64-bit integers are rejected: they must be quoted in the profile file to keep
/// their precision.
pub fn json_args_to_text(args: &[Value]) -> Result<Vec<String>> {
    args.iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) if !number.is_u64() && !number.is_i64() => anyhow::bail!(
                "Constructor argument {} ({}) cannot be represented exactly, write it as a string",
                index + 1,
                number
            ),
            other => Ok(other.to_string()),
        })
        .collect()
}

/// Split a comma-separated line typed by the operator into trimmed values.
///
/// A blank line means no arguments.
pub fn split_argument_line(line: &str) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![];
    }

    line.split(',').map(|arg| arg.trim().to_string()).collect()
}

fn coerce_value(param: &Param, raw: &str) -> Result<DynSolValue> {
    let ty: DynSolType = param
        .resolve()
        .with_context(|| format!("Unsupported constructor parameter type {}", param.ty))?;

    ty.coerce_str(raw).with_context(|| {
        format!(
            "Invalid value '{}' for constructor parameter '{}' ({})",
            raw, param.name, param.ty
        )
    })
}

/// ABI-encode constructor arguments against the constructor declared in `abi`.
pub fn encode_constructor_args(abi: &JsonAbi, args: &[String]) -> Result<Vec<u8>> {
    let Some(constructor) = abi.constructor() else {
        anyhow::bail!(
            "{} constructor argument(s) given but the contract declares no constructor",
            args.len()
        );
    };

    if constructor.inputs.len() != args.len() {
        anyhow::bail!(
            "Constructor expects {} argument(s), got {}",
            constructor.inputs.len(),
            args.len()
        );
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .map(|(param, raw)| coerce_value(param, raw))
        .collect::<Result<Vec<_>>>()?;

    constructor
        .abi_encode_input(&values)
        .context("Failed to ABI-encode constructor arguments")
}

/// Build the contract-creation payload: bytecode, followed by the encoded arguments if any.
///
/// The bare bytecode is only produced when the constructor takes no parameter.
pub fn init_code(artifact: &CompiledArtifact, args: &[String]) -> Result<Bytes> {
    let inputs = constructor_inputs(&artifact.abi);
    if args.is_empty() {
        if !inputs.is_empty() {
            anyhow::bail!(
                "Constructor of {} expects {} argument(s), none given",
                artifact.contract_name,
                inputs.len()
            );
        }
        return Ok(artifact.bytecode.clone());
    }

    let encoded = encode_constructor_args(&artifact.abi, args)?;
    tracing::debug!(
        contract = %artifact.contract_name,
        args = args.len(),
        encoded_len = encoded.len(),
        "Constructor arguments encoded"
    );

    Ok(artifact.bytecode.iter().copied().chain(encoded).collect())
}
