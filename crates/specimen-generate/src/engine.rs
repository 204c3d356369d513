use rand::{Rng, RngCore};
use specimen_core::{
    BOOLEAN_TOKENS, Deferred, Effect, Error, FunctionValue, PipelineDef, Schema, SchemaDef, Value,
    conforms, is_coercion,
};
use tracing::{debug, trace, warn};

use crate::errors::GenerationError;
use crate::generators::{CustomGenerator, PluginRegistry, collections, primitives};
use crate::model::GenerateOptions;

/// Depth beyond `max_depth` at which a schema that never bottoms out is
/// reported instead of followed.
const RECURSION_ALLOWANCE: usize = 64;

/// Position of a node within the value being generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationContext {
    pub depth: usize,
}

impl GenerationContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }
}

/// Entry point for generating values from schema graphs.
#[derive(Debug, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
    plugins: PluginRegistry,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            plugins: PluginRegistry::new(),
        }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GenerateOptions) {
        self.options = options;
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn register_plugin(&mut self, schema: &Schema, plugin: impl CustomGenerator + 'static) {
        self.plugins.register(schema, plugin);
    }

    /// Generates one value conforming to `schema`.
    pub fn generate(
        &self,
        schema: &Schema,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        debug!(kind = %schema.kind(), max_depth = self.options.max_depth, "generating value");
        self.generate_value(schema, GenerationContext::root(), rng)
    }

    /// Generates one value accepted by both schemas.
    pub fn generate_intersection(
        &self,
        left: &Schema,
        right: &Schema,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        let merged = specimen_intersect::resolve(left, right)?;
        self.generate(&merged, rng)
    }

    pub(crate) fn past_depth(&self, ctx: GenerationContext) -> bool {
        ctx.depth >= self.options.max_depth
    }

    /// Generates a value for `schema` at `ctx`. Registered plugins take over
    /// their node before any built-in strategy is considered.
    pub fn generate_value(
        &self,
        schema: &Schema,
        ctx: GenerationContext,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        if ctx.depth > self.options.max_depth + RECURSION_ALLOWANCE {
            return Err(Error::invalid(format!(
                "{} at depth {} never reaches a finite value",
                schema.kind(),
                ctx.depth
            ))
            .into());
        }
        if let Some(plugin) = self.plugins.get(schema) {
            trace!(kind = %schema.kind(), depth = ctx.depth, "custom generator");
            return plugin.generate(schema, ctx, self, rng);
        }
        trace!(kind = %schema.kind(), depth = ctx.depth, "dispatch");

        let value = match schema.def() {
            SchemaDef::String(def) => {
                Value::String(primitives::string(schema, def, &self.options, rng)?)
            }
            SchemaDef::Number(def) => Value::Number(primitives::number(def, &self.options, rng)?),
            SchemaDef::NaN => Value::Number(f64::NAN),
            SchemaDef::BigInt(def) => Value::BigInt(primitives::bigint(def, &self.options, rng)?),
            SchemaDef::Boolean => Value::Bool(rng.random_bool(0.5)),
            SchemaDef::Date(def) => Value::Date(primitives::date(def, rng)?),
            SchemaDef::Symbol => Value::Symbol(format!("specimen.{}", rng.random::<u32>())),
            SchemaDef::Undefined | SchemaDef::Void => Value::Undefined,
            SchemaDef::Null => Value::Null,
            SchemaDef::Any | SchemaDef::Unknown => self.loose_value(ctx, rng),
            SchemaDef::Never => {
                return Err(Error::impossible("never has no values").into());
            }
            SchemaDef::Literal(literal) => literal.to_value(),
            SchemaDef::Enum(def) => {
                if def.values.is_empty() {
                    return Err(Error::impossible("enum has no members").into());
                }
                Value::String(def.values[rng.random_range(0..def.values.len())].clone())
            }
            SchemaDef::NativeEnum(def) => {
                if def.entries.is_empty() {
                    return Err(Error::impossible("native enum has no members").into());
                }
                def.entries[rng.random_range(0..def.entries.len())].1.to_value()
            }
            SchemaDef::Array(def) => collections::array(self, def, ctx, rng)?,
            SchemaDef::Object(def) => collections::object(self, def, ctx, rng)?,
            SchemaDef::Tuple(def) => collections::tuple(self, def, ctx, rng)?,
            SchemaDef::Record(def) => collections::record(self, def, ctx, rng)?,
            SchemaDef::Map(def) => collections::map(self, def, ctx, rng)?,
            SchemaDef::Set(def) => collections::set(self, def, ctx, rng)?,
            SchemaDef::Union(def) => {
                let live: Vec<&Schema> = def
                    .options
                    .iter()
                    .filter(|option| !matches!(option.def(), SchemaDef::Never))
                    .collect();
                let chosen = match live.len() {
                    0 => def
                        .options
                        .first()
                        .ok_or_else(|| Error::impossible("union has no options"))?,
                    len => live[rng.random_range(0..len)],
                };
                self.generate_value(chosen, ctx, rng)?
            }
            SchemaDef::DiscriminatedUnion(def) => {
                if def.options.is_empty() {
                    return Err(Error::impossible("discriminated union has no options").into());
                }
                let chosen = &def.options[rng.random_range(0..def.options.len())];
                self.generate_value(chosen, ctx, rng)?
            }
            SchemaDef::Intersection(def) => {
                let merged = specimen_intersect::resolve(&def.left, &def.right)?;
                self.generate_value(&merged, ctx, rng)?
            }
            SchemaDef::Lazy(thunk) => self.generate_value(&thunk.force()?, ctx.deeper(), rng)?,
            SchemaDef::Effects(def) => match &def.effect {
                Effect::Refinement { check, message } => {
                    let attempts = self.options.max_attempts.max(1);
                    for _ in 0..attempts {
                        let candidate = self.generate_value(&def.inner, ctx, rng)?;
                        if check.test(&candidate) {
                            return Ok(candidate);
                        }
                    }
                    warn!(attempts, message = %message, "refinement sampling gave up");
                    return Err(GenerationError::RefinementExhausted { attempts });
                }
                Effect::Transform(map) => {
                    let inner = self.generate_value(&def.inner, ctx, rng)?;
                    if self.options.apply_transforms {
                        map.apply(inner)
                    } else {
                        inner
                    }
                }
            },
            SchemaDef::Pipeline(def) => self.pipeline(def, ctx, rng)?,
            SchemaDef::Function(def) => {
                let returns = self.generate_value(&def.returns, ctx.deeper(), rng)?;
                Value::Function(FunctionValue::new(returns))
            }
            SchemaDef::Promise(inner) => {
                let delay = self.options.promise_delay();
                let deferred = match self.generate_value(inner, ctx.deeper(), rng) {
                    Ok(value) => Deferred::resolved(value, delay),
                    Err(GenerationError::Schema(err)) => Deferred::rejected(err, delay),
                    Err(err) => Deferred::rejected(Error::invalid(err.to_string()), delay),
                };
                Value::Promise(deferred)
            }
            SchemaDef::Optional(inner) => {
                if self.past_depth(ctx) || rng.random_bool(0.5) {
                    Value::Undefined
                } else {
                    self.generate_value(inner, ctx, rng)?
                }
            }
            SchemaDef::Nullable(inner) => {
                if self.past_depth(ctx) || rng.random_bool(0.5) {
                    Value::Null
                } else {
                    self.generate_value(inner, ctx, rng)?
                }
            }
            SchemaDef::Default(def) => {
                if rng.random_bool(0.5) {
                    def.value.clone()
                } else {
                    self.generate_value(&def.inner, ctx, rng)?
                }
            }
            SchemaDef::Catch(def) => match self.generate_value(&def.inner, ctx, rng) {
                Ok(value) => value,
                Err(GenerationError::Schema(_)) => def.value.clone(),
                Err(err) => return Err(err),
            },
            SchemaDef::Readonly(inner) => {
                Value::Frozen(Box::new(self.generate_value(inner, ctx, rng)?))
            }
            SchemaDef::Branded(def) => self.generate_value(&def.inner, ctx, rng)?,
        };
        Ok(value)
    }

    /// Pipeline values are always inputs the pipeline parses successfully.
    fn pipeline(
        &self,
        def: &PipelineDef,
        ctx: GenerationContext,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        if is_coercion(&def.input, &def.output) {
            let tokens: Vec<Value> = BOOLEAN_TOKENS
                .iter()
                .map(|(token, _)| Value::String((*token).to_string()))
                .filter(|token| conforms(&def.input, token).is_ok())
                .collect();
            if tokens.is_empty() {
                return Err(Error::infeasible("input stage rejects every boolean token").into());
            }
            return Ok(tokens[rng.random_range(0..tokens.len())].clone());
        }
        match specimen_intersect::resolve(&def.input, &def.output) {
            Ok(merged) => self.generate_value(&merged, ctx, rng),
            Err(Error::UnsupportedCombination { left, right }) => {
                trace!(%left, %right, "pipeline stages do not unify, drawing from input");
                self.generate_value(&def.input, ctx, rng)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// A small JSON-like value for schemas that accept anything.
    pub(crate) fn loose_value(&self, ctx: GenerationContext, rng: &mut dyn RngCore) -> Value {
        let choices = if self.past_depth(ctx) { 4 } else { 5 };
        match rng.random_range(0..choices) {
            0 => Value::Null,
            1 => Value::Bool(rng.random_bool(0.5)),
            2 => Value::Number(f64::from(rng.random_range(-100_i32..=100))),
            3 => {
                let len = rng.random_range(0..=8);
                Value::String(
                    (0..len)
                        .map(|_| {
                            let charset = primitives::DEFAULT_CHARSET.as_bytes();
                            char::from(charset[rng.random_range(0..charset.len())])
                        })
                        .collect(),
                )
            }
            _ => {
                let len = rng.random_range(0..=3);
                Value::Array((0..len).map(|_| self.loose_value(ctx.deeper(), rng)).collect())
            }
        }
    }
}
