//! Load-time compilation of a profile.
//!
//! Every expression is parsed, every operator validated and every dataref
//! and command resolved exactly once, when the profile becomes active. The
//! tick and input paths only ever see the compiled form.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, instrument};

use super::conditions::Snapshot;
use crate::error::{BravoError, Result};
use crate::expr::{CompileError, Program};
use crate::profile::{
    ButtonId, Command, ConditionProfile, Dataref, DatarefCondition, GateId, KnobId, LedId,
    Profile,
};
use crate::telemetry::{CommandHandle, DatarefHandle, Reading, Resolver};

/// Threshold comparison operators accepted in profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Exact float comparison of `value` against `threshold`.
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dataref reference with its resolved handle, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDataref {
    pub name: String,
    pub index: u32,
    pub handle: Option<DatarefHandle>,
}

impl BoundDataref {
    fn bind(name: &str, index: u32, resolver: Option<&Resolver>) -> Self {
        let name = name.trim().to_string();
        let handle = resolver.and_then(|r| r.resolve_dataref(&name));
        Self {
            name,
            index,
            handle,
        }
    }

    /// Reading from a tick snapshot.
    pub fn reading(&self, snapshot: &Snapshot) -> Reading {
        self.handle
            .map_or(Reading::Missing, |handle| snapshot.reading(handle, self.index))
    }

    /// Live reading straight from the simulator.
    pub fn read(&self, resolver: &Resolver) -> Reading {
        self.handle
            .map_or(Reading::Missing, |handle| resolver.read(handle, self.index))
    }

    /// Array element to address on write; scalars are written whole.
    pub const fn write_index(&self) -> Option<u32> {
        if self.index == 0 { None } else { Some(self.index) }
    }
}

/// A command reference with its resolved handle, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCommand {
    pub name: String,
    pub handle: Option<CommandHandle>,
}

impl BoundCommand {
    fn bind(command: &Command, resolver: Option<&Resolver>) -> Self {
        let name = command.command_str.trim().to_string();
        let handle = resolver.and_then(|r| r.resolve_command(&name));
        Self { name, handle }
    }
}

fn bind_commands(commands: &[Command], resolver: Option<&Resolver>) -> Vec<BoundCommand> {
    commands
        .iter()
        .filter(|c| !c.command_str.trim().is_empty())
        .map(|c| BoundCommand::bind(c, resolver))
        .collect()
}

fn bind_datarefs(datarefs: &[Dataref], resolver: Option<&Resolver>) -> Vec<BoundDataref> {
    datarefs
        .iter()
        .filter(|d| !d.dataref_str.trim().is_empty())
        .map(|d| BoundDataref::bind(&d.dataref_str, d.index, resolver))
        .collect()
}

/// One dataref checked against its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub dataref: BoundDataref,
    pub operator: Option<Operator>,
    pub threshold: Option<f64>,
}

impl Comparison {
    /// Missing readings never satisfy a comparison.
    ///
    /// Without an operator the threshold is matched with `==`; without a
    /// threshold the operator compares against zero; with neither the
    /// reading itself must be non-zero.
    pub fn holds(&self, reading: Reading) -> bool {
        let Some(value) = reading.value() else {
            return false;
        };
        match (self.operator, self.threshold) {
            (Some(op), threshold) => op.apply(value, threshold.unwrap_or(0.0)),
            (None, Some(threshold)) => value == threshold,
            (None, None) => value != 0.0,
        }
    }
}

/// How plain comparisons are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    All,
    Any,
}

/// A condition in the form chosen when the profile was loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledCondition {
    /// A boolean expression over named dataref values.
    Expression {
        program: Program,
        inputs: Vec<BoundDataref>,
    },
    /// Threshold comparisons combined with AND or OR.
    Comparisons {
        checks: Vec<Comparison>,
        combine: Combine,
    },
}

impl CompiledCondition {
    /// Compile `profile`, or `None` when it declares nothing.
    pub fn compile(
        profile: &ConditionProfile,
        context: &str,
        resolver: Option<&Resolver>,
    ) -> Result<Option<Self>> {
        if profile.is_empty() {
            return Ok(None);
        }

        let datarefs: Vec<&DatarefCondition> = profile
            .datarefs
            .iter()
            .filter(|d| !d.dataref_str.trim().is_empty())
            .collect();

        let mut checks = Vec::with_capacity(datarefs.len());
        for dataref in &datarefs {
            let operator = match dataref.operator.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(op) => Some(Operator::parse(op).ok_or_else(|| {
                    BravoError::InvalidOperator {
                        operator: op.to_string(),
                        context: context.to_string(),
                    }
                })?),
            };
            checks.push(Comparison {
                dataref: BoundDataref::bind(&dataref.dataref_str, dataref.index, resolver),
                operator,
                threshold: dataref.threshold,
            });
        }

        let expression = profile
            .condition
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let combine = match expression.map(str::to_lowercase).as_deref() {
            None | Some("all") => Some(Combine::All),
            Some("any") => Some(Combine::Any),
            Some(_) => None,
        };
        if let Some(combine) = combine {
            return Ok(Some(Self::Comparisons { checks, combine }));
        }

        let source = expression.unwrap_or_default();
        let variables: Vec<String> = datarefs.iter().map(|d| d.variable_name()).collect();
        let unique: BTreeSet<&String> = variables.iter().collect();
        if unique.len() != variables.len() {
            return Err(BravoError::ExpressionCompile {
                context: context.to_string(),
                reason: "two datarefs share a variable name; set `name` on one of them"
                    .to_string(),
            });
        }

        let program = Program::compile(source, &variables).map_err(|e| match e {
            CompileError::UnknownVariable(name) => BravoError::UnknownVariable {
                name,
                context: context.to_string(),
            },
            CompileError::Syntax { .. } => BravoError::ExpressionCompile {
                context: context.to_string(),
                reason: e.to_string(),
            },
        })?;

        let inputs = checks.into_iter().map(|c| c.dataref).collect();
        Ok(Some(Self::Expression { program, inputs }))
    }

    /// Evaluate against a tick snapshot. Missing telemetry yields `false`.
    pub fn evaluate(&self, snapshot: &Snapshot) -> bool {
        match self {
            Self::Expression { program, inputs } => {
                let values: Vec<Reading> = inputs.iter().map(|d| d.reading(snapshot)).collect();
                program.evaluate(&values)
            }
            Self::Comparisons { checks, combine } => {
                if checks.is_empty() {
                    return false;
                }
                let mut results = checks.iter().map(|c| c.holds(c.dataref.reading(snapshot)));
                match combine {
                    Combine::All => results.all(|held| held),
                    Combine::Any => results.any(|held| held),
                }
            }
        }
    }

    /// Every dataref this condition reads.
    pub fn datarefs(&self) -> Box<dyn Iterator<Item = &BoundDataref> + '_> {
        match self {
            Self::Expression { inputs, .. } => Box::new(inputs.iter()),
            Self::Comparisons { checks, .. } => Box::new(checks.iter().map(|c| &c.dataref)),
        }
    }
}

/// Where a step-writing knob gets its increment.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSource {
    pub dataref: Option<BoundDataref>,
    pub value: Option<f64>,
    pub fallback: f64,
}

impl StepSource {
    /// Live step dataref, else the fixed value, else the fallback.
    pub fn current(&self, resolver: &Resolver) -> f64 {
        self.dataref
            .as_ref()
            .and_then(|d| d.read(resolver).value())
            .or(self.value)
            .unwrap_or(self.fallback)
    }
}

/// What turning a knob does, fixed at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum KnobAction {
    /// Write `current ± detents × step` to every target.
    StepWrite {
        targets: Vec<BoundDataref>,
        step: StepSource,
    },
    /// Invoke `increase` or `decrease` once per detent.
    Commands {
        increase: BoundCommand,
        decrease: Option<BoundCommand>,
    },
    Unbound,
}

/// Button command lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledButton {
    pub single_click: Vec<BoundCommand>,
    pub double_click: Vec<BoundCommand>,
}

/// A profile ready for the tick and input paths.
///
/// Immutable once built; the engine swaps whole `Arc<ActiveProfile>`s.
#[derive(Debug)]
pub struct ActiveProfile {
    profile: Profile,
    leds: BTreeMap<LedId, CompiledCondition>,
    gates: BTreeMap<GateId, CompiledCondition>,
    buttons: BTreeMap<ButtonId, CompiledButton>,
    knobs: BTreeMap<KnobId, KnobAction>,
    polled: Vec<DatarefHandle>,
    unresolved: Vec<String>,
}

impl ActiveProfile {
    /// Validate and bind `profile`.
    ///
    /// With no resolver, nothing is looked up and every handle stays
    /// empty; this is how profiles are checked offline.
    #[instrument(skip_all, fields(name = %profile.name()))]
    pub fn compile(profile: Profile, resolver: Option<&Resolver>) -> Result<Self> {
        let mut leds = BTreeMap::new();
        if let Some(map) = &profile.leds {
            for (id, led) in map {
                let context = format!("leds.{id}");
                if let Some(condition) = CompiledCondition::compile(led, &context, resolver)? {
                    leds.insert(*id, condition);
                }
            }
        }

        let mut gates = BTreeMap::new();
        if let Some(map) = &profile.conditions {
            for (id, gate) in map {
                let context = format!("conditions.{id}");
                if let Some(condition) = CompiledCondition::compile(gate, &context, resolver)? {
                    gates.insert(*id, condition);
                }
            }
        }

        let buttons = profile
            .buttons
            .iter()
            .flatten()
            .map(|(id, button)| {
                (
                    *id,
                    CompiledButton {
                        single_click: bind_commands(&button.single_click, resolver),
                        double_click: bind_commands(&button.double_click, resolver),
                    },
                )
            })
            .collect();

        let knobs = KnobId::ALL
            .iter()
            .map(|id| (*id, knob_action(&profile, *id, resolver)))
            .filter(|(_, action)| *action != KnobAction::Unbound)
            .collect();

        let mut compiled = Self {
            profile,
            leds,
            gates,
            buttons,
            knobs,
            polled: Vec::new(),
            unresolved: Vec::new(),
        };
        compiled.collect_references(resolver.is_some());

        debug!(
            leds = compiled.leds.len(),
            gates = compiled.gates.len(),
            knobs = compiled.knobs.len(),
            polled = compiled.polled.len(),
            "Compiled profile"
        );
        Ok(compiled)
    }

    fn collect_references(&mut self, resolved: bool) {
        let mut polled = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        for condition in self.leds.values().chain(self.gates.values()) {
            for dataref in condition.datarefs() {
                match dataref.handle {
                    Some(handle) => {
                        polled.insert(handle.0);
                    }
                    None => {
                        unresolved.insert(dataref.name.clone());
                    }
                }
            }
        }
        self.polled = polled.into_iter().map(DatarefHandle).collect();
        if resolved {
            self.unresolved = unresolved.into_iter().collect();
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        self.profile.name()
    }

    pub fn led(&self, id: LedId) -> Option<&CompiledCondition> {
        self.leds.get(&id)
    }

    /// Dataref holding the gear extension ratios: the gear indicator's first.
    pub fn gear_source(&self) -> Option<&BoundDataref> {
        self.leds.get(&LedId::Gear).and_then(|c| c.datarefs().next())
    }

    /// Enabled gates only.
    pub fn gate(&self, id: GateId) -> Option<&CompiledCondition> {
        self.gates.get(&id)
    }

    pub fn button(&self, id: ButtonId) -> Option<&CompiledButton> {
        self.buttons.get(&id)
    }

    pub fn knob(&self, id: KnobId) -> &KnobAction {
        self.knobs.get(&id).unwrap_or(&KnobAction::Unbound)
    }

    /// Distinct dataref handles read every tick.
    pub fn polled(&self) -> &[DatarefHandle] {
        &self.polled
    }

    /// Condition datarefs the simulator didn't know about.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}

fn knob_action(profile: &Profile, id: KnobId, resolver: Option<&Resolver>) -> KnobAction {
    let Some(knob) = profile.knob(id) else {
        return KnobAction::Unbound;
    };

    let targets = bind_datarefs(&knob.datarefs, resolver);
    let commands = bind_commands(&knob.commands, resolver);
    let step_profile = id.step().and_then(|step| profile.step(step));

    if !targets.is_empty() && (step_profile.is_some() || commands.is_empty()) {
        let step = StepSource {
            dataref: step_profile
                .and_then(|s| bind_datarefs(&s.datarefs, resolver).into_iter().next()),
            value: step_profile.and_then(|s| s.value),
            fallback: id.default_step(),
        };
        return KnobAction::StepWrite { targets, step };
    }

    let mut commands = commands.into_iter();
    match commands.next() {
        Some(increase) => KnobAction::Commands {
            increase,
            decrease: commands.next(),
        },
        None => KnobAction::Unbound,
    }
}
