//! Evaluates a [`ShapePlan`] the way generated code would run.
//!
//! Values are opaque literals. Invoking an entry point follows its delegation
//! chain into the concrete builder and then through the builder-backed
//! constructor, so every compatibility claim of a plan can be checked without
//! a target compiler.

use bincompat_types::plan::{
    ArgValue, BuilderSpec, BuilderTier, CallbackArg, ConstructionPlan, Delegation,
    DelegationTarget, EntryVariant, HashSpec, IdentitySpec, SetterKind, ShapePlan, StorageInit,
    ValueSource,
};
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    #[error("{shape} has no construction plan")]
    NotConstructible { shape: String },

    #[error("no entry point v{version}/{}", .variant.as_str())]
    UnknownEntry { version: u32, variant: EntryVariant },

    #[error("{shape} has no factory function")]
    NoFactory { shape: String },

    #[error("expected {expected} argument(s), got {got}")]
    ArgCount { expected: usize, got: usize },

    #[error("no callback accepted here")]
    UnexpectedCallback,

    #[error("{} has no property '{field}'", .tier.type_name())]
    UnknownProperty { tier: BuilderTier, field: String },

    #[error("property '{field}' has no setter")]
    ReadOnlyProperty { field: String },

    #[error("unbound parameter '{name}'")]
    Unbound { name: String },

    #[error("delegation chain does not terminate")]
    DelegationCycle,
}

/// One setter call made inside a builder callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCall {
    pub field: String,
    pub value: String,
}

impl SetCall {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A constructed value: field name to literal, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub type_name: String,
    pub values: Vec<(String, String)>,
}

impl Instance {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct Interpreter<'a> {
    shape: &'a ShapePlan,
    construction: &'a ConstructionPlan,
    builder: &'a BuilderSpec,
    identity: &'a IdentitySpec,
}

type Env = BTreeMap<String, String>;

impl<'a> Interpreter<'a> {
    pub fn new(shape: &'a ShapePlan) -> Result<Self, InterpretError> {
        match (&shape.construction, &shape.builder, &shape.identity) {
            (Some(construction), Some(builder), Some(identity)) => Ok(Self {
                shape,
                construction,
                builder,
                identity,
            }),
            _ => Err(InterpretError::NotConstructible {
                shape: shape.qualified_name.clone(),
            }),
        }
    }

    /// Calls one public entry point.
    pub fn invoke(
        &self,
        version: u32,
        variant: EntryVariant,
        args: &[&str],
        callback: &[SetCall],
    ) -> Result<Instance, InterpretError> {
        let mut version = version;
        let mut variant = variant;
        let mut values: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut callback = callback.to_vec();
        let mut tier = None;

        for _ in 0..=self.construction.overloads.len() * 2 {
            let entry = self
                .construction
                .overload(version)
                .and_then(|o| o.entry(variant))
                .ok_or(InterpretError::UnknownEntry { version, variant })?;

            if values.len() != entry.params.len() {
                return Err(InterpretError::ArgCount {
                    expected: entry.params.len(),
                    got: values.len(),
                });
            }
            if tier.is_none() {
                tier = entry.callback;
                if tier.is_none() && !callback.is_empty() {
                    return Err(InterpretError::UnexpectedCallback);
                }
            }

            let env: Env = entry
                .params
                .iter()
                .map(|p| p.name.clone())
                .zip(values)
                .collect();
            let args = bind(&entry.delegation.args, &env)?;
            callback = pass_callback(&entry.delegation, callback);

            match entry.delegation.target {
                DelegationTarget::Overload {
                    version: next,
                    variant: next_variant,
                } => {
                    version = next;
                    variant = next_variant;
                    values = args;
                }
                DelegationTarget::ConcreteBuilder => {
                    let tier = tier.unwrap_or(BuilderTier::Full);
                    return self.build(args, tier, &callback, &[]);
                }
            }
        }

        Err(InterpretError::DelegationCycle)
    }

    /// Calls the factory function with its full-tier callback.
    pub fn factory(&self, args: &[&str], callback: &[SetCall]) -> Result<Instance, InterpretError> {
        let factory =
            self.construction
                .factory
                .as_ref()
                .ok_or_else(|| InterpretError::NoFactory {
                    shape: self.shape.qualified_name.clone(),
                })?;
        if args.len() != factory.params.len() {
            return Err(InterpretError::ArgCount {
                expected: factory.params.len(),
                got: args.len(),
            });
        }
        let env: Env = factory
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(args.iter().map(|s| s.to_string()))
            .collect();
        let bound = bind(&factory.delegation.args, &env)?;
        self.build(bound, factory.callback, callback, &[])
    }

    /// Rebuilds `instance` through the concrete builder and applies a full-tier callback.
    pub fn copy(&self, instance: &Instance, callback: &[SetCall]) -> Result<Instance, InterpretError> {
        let copy = &self.construction.copy;
        let read = |name: &String| {
            instance
                .get(name)
                .map(str::to_string)
                .ok_or_else(|| InterpretError::Unbound { name: name.clone() })
        };
        let args = copy.builder_args.iter().map(read).collect::<Result<Vec<_>, _>>()?;
        let presets = copy
            .setters
            .iter()
            .map(|name| read(name).map(|v| SetCall::new(name.clone(), v)))
            .collect::<Result<Vec<_>, _>>()?;
        self.build(args, copy.callback, callback, &presets)
    }

    pub fn equals(&self, a: &Instance, b: &Instance) -> bool {
        a.type_name == b.type_name
            && self
                .identity
                .equality
                .iter()
                .all(|field| a.get(field) == b.get(field))
    }

    pub fn hash(&self, instance: &Instance) -> u64 {
        let mut hasher = DefaultHasher::new();
        match &self.identity.hash {
            HashSpec::Fields { fields } => {
                for field in fields {
                    instance.get(field).hash(&mut hasher);
                }
            }
            HashSpec::TypeMarker { type_name } => type_name.hash(&mut hasher),
        }
        hasher.finish()
    }

    /// `Name(a=1, b=2)` over every field.
    pub fn display(&self, instance: &Instance) -> String {
        let pairs: Vec<String> = self
            .identity
            .display
            .fields
            .iter()
            .map(|f| format!("{}={}", f, instance.get(f).unwrap_or_default()))
            .collect();
        format!("{}({})", self.identity.display.type_name, pairs.join(", "))
    }

    fn build(
        &self,
        args: Vec<String>,
        tier: BuilderTier,
        callback: &[SetCall],
        presets: &[SetCall],
    ) -> Result<Instance, InterpretError> {
        let concrete = &self.builder.concrete;
        if args.len() != concrete.constructor_params.len() {
            return Err(InterpretError::ArgCount {
                expected: concrete.constructor_params.len(),
                got: args.len(),
            });
        }
        let ctor: Env = concrete
            .constructor_params
            .iter()
            .map(|p| p.name.clone())
            .zip(args)
            .collect();

        let mut storage = Env::new();
        for slot in &concrete.storage {
            let value = match &slot.init {
                StorageInit::ConstructorParam => {
                    ctor.get(&slot.name)
                        .cloned()
                        .ok_or_else(|| InterpretError::Unbound {
                            name: slot.name.clone(),
                        })?
                }
                StorageInit::Literal { literal } => literal.clone(),
            };
            storage.insert(slot.name.clone(), value);
        }

        for call in presets {
            storage.insert(call.field.clone(), call.value.clone());
        }
        for call in callback {
            self.apply(tier, call, &mut storage)?;
        }

        let values = self
            .construction
            .from_builder
            .assignments
            .iter()
            .map(|a| {
                let value = match &a.source {
                    ValueSource::Storage => {
                        storage
                            .get(&a.field)
                            .cloned()
                            .ok_or_else(|| InterpretError::Unbound {
                                name: a.field.clone(),
                            })?
                    }
                    ValueSource::Literal { literal } => literal.clone(),
                };
                Ok((a.field.clone(), value))
            })
            .collect::<Result<Vec<_>, InterpretError>>()?;

        Ok(Instance {
            type_name: self.shape.qualified_name.clone(),
            values,
        })
    }

    fn apply(&self, tier: BuilderTier, call: &SetCall, storage: &mut Env) -> Result<(), InterpretError> {
        let property = self
            .builder
            .tier(tier)
            .and_then(|t| t.property(&call.field))
            .ok_or_else(|| InterpretError::UnknownProperty {
                tier,
                field: call.field.clone(),
            })?;
        match property.setter {
            SetterKind::Live => {
                storage.insert(call.field.clone(), call.value.clone());
                Ok(())
            }
            SetterKind::Inert => Ok(()),
            SetterKind::None => Err(InterpretError::ReadOnlyProperty {
                field: call.field.clone(),
            }),
        }
    }
}

fn bind(args: &[ArgValue], env: &Env) -> Result<Vec<String>, InterpretError> {
    args.iter()
        .map(|arg| match arg {
            ArgValue::Param { name } => env
                .get(name)
                .cloned()
                .ok_or_else(|| InterpretError::Unbound { name: name.clone() }),
            ArgValue::Literal { literal } => Ok(literal.clone()),
        })
        .collect()
}

fn pass_callback(delegation: &Delegation, callback: Vec<SetCall>) -> Vec<SetCall> {
    match delegation.callback {
        CallbackArg::Forward => callback,
        CallbackArg::None | CallbackArg::Empty => Vec::new(),
    }
}
