//! Function-scoped analysis state
//!
//! `AnalysisContext` accumulates variable facts during one walk of a
//! function body. Usage flags only ever go from false to true. The context
//! is consumed by [`AnalysisContext::finish`], which decides each
//! variable's storage and freezes everything into [`FunctionFacts`]; the
//! generator only ever sees the frozen form.

use std::collections::HashMap;
use std::fmt;

use crate::debug::{analyze_debug_enabled, debug_log};
use crate::ir::FunctionInfo;
use crate::types::ExprType;

/// Index of a variable in its function's table
pub type VarId = usize;

/// PHP superglobals, always read through the environment
pub const SUPERGLOBALS: &[&str] = &[
    "GLOBALS", "_GET", "_POST", "_COOKIE", "_SERVER", "_ENV", "_FILES", "_REQUEST", "_SESSION",
];

pub fn is_superglobal(name: &str) -> bool {
    SUPERGLOBALS.contains(&name)
}

/// How generated code stores a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Unboxed `i64`, `f64` or `bool` local
    Typed(ExprType),
    /// Local `Value`
    Value,
    /// Shared `Var` cell
    Ref,
    /// Cell in the dynamic symbol table frame, by index
    Symbol(usize),
    /// Superglobal, looked up through the environment
    Global,
}

/// Monotonic usage flags of one variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VarFlags {
    pub is_reference: bool,
    pub is_modified: bool,
    pub is_symbol_table_visible: bool,
    pub is_argument: bool,
    pub is_assigned: bool,
    /// Read at a point where it was not definitely assigned
    pub read_unassigned: bool,
    pub is_unset: bool,
}

impl fmt::Display for VarFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.is_argument, "arg"),
            (self.is_reference, "ref"),
            (self.is_modified, "modified"),
            (self.is_symbol_table_visible, "symbol"),
            (self.is_assigned, "assigned"),
            (self.read_unassigned, "read-unassigned"),
            (self.is_unset, "unset"),
        ];
        let set: Vec<&str> = names.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
        write!(f, "[{}]", set.join(" "))
    }
}

/// Frozen facts about one variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarFacts {
    pub name: String,
    pub flags: VarFlags,
    /// Join of the types of every value assigned to the variable
    pub assigned_type: ExprType,
    pub storage: Storage,
}

/// Analysis output for one function, read-only during generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionFacts {
    vars: Vec<VarFacts>,
    index: HashMap<String, VarId>,
    temps: Vec<String>,
    uses_symbol_table: bool,
    symbol_names: Vec<String>,
}

impl FunctionFacts {
    /// Variables in first-appearance order
    pub fn vars(&self) -> &[VarFacts] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarFacts {
        &self.vars[id]
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    /// Facts of the variable called `name`
    pub fn var_named(&self, name: &str) -> Option<&VarFacts> {
        self.lookup(name).map(|id| &self.vars[id])
    }

    pub fn storage(&self, id: VarId) -> Storage {
        self.vars[id].storage
    }

    /// Temp variables in allocation order
    pub fn temps(&self) -> &[String] {
        &self.temps
    }

    pub fn uses_symbol_table(&self) -> bool {
        self.uses_symbol_table
    }

    /// Names bound in the symbol table frame, by `Storage::Symbol` index
    pub fn symbol_names(&self) -> &[String] {
        &self.symbol_names
    }
}

/// Whether a variable has a value at the current point of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assigned {
    Not,
    Maybe,
    Definitely,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FlowVar {
    assigned: Assigned,
    ty: ExprType,
}

const UNASSIGNED: FlowVar = FlowVar {
    assigned: Assigned::Not,
    ty: ExprType::Unknown,
};

/// Flow-sensitive state saved around conditionally evaluated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState(Vec<FlowVar>);

#[derive(Debug)]
struct VarState {
    name: String,
    flags: VarFlags,
    assigned_type: ExprType,
}

/// Mutable analysis state of one function
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    info: &'a FunctionInfo,
    vars: Vec<VarState>,
    index: HashMap<String, VarId>,
    flow: Vec<FlowVar>,
    temps: Vec<String>,
    temp_counter: usize,
    uses_symbol_table: bool,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(info: &'a FunctionInfo) -> Self {
        Self {
            info,
            vars: Vec::new(),
            index: HashMap::new(),
            flow: Vec::new(),
            temps: Vec::new(),
            temp_counter: 0,
            uses_symbol_table: info.uses_symbol_table,
        }
    }

    pub fn info(&self) -> &FunctionInfo {
        self.info
    }

    pub fn is_method(&self) -> bool {
        self.info.is_method()
    }

    pub fn has_receiver(&self) -> bool {
        self.info.has_receiver()
    }

    // ========== Variable table ==========

    /// Slot of `name`, created on first sight
    pub fn lookup_or_declare(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.vars.len();
        self.vars.push(VarState {
            name: name.to_string(),
            flags: VarFlags::default(),
            assigned_type: ExprType::Unknown,
        });
        self.flow.push(UNASSIGNED);
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    pub fn flags(&self, id: VarId) -> VarFlags {
        self.vars[id].flags
    }

    /// Declare a parameter or closure capture
    pub fn declare_argument(&mut self, name: &str, by_ref: bool) -> VarId {
        let id = self.lookup_or_declare(name);
        let var = &mut self.vars[id];
        var.flags.is_argument = true;
        if by_ref {
            var.flags.is_reference = true;
        }
        self.flow[id] = FlowVar {
            assigned: Assigned::Definitely,
            ty: ExprType::Value,
        };
        id
    }

    /// Read of a variable: its flow type when that type can be trusted
    pub fn read_var(&mut self, id: VarId) -> ExprType {
        let flow = self.flow[id];
        if flow.assigned != Assigned::Definitely {
            self.vars[id].flags.read_unassigned = true;
            return ExprType::Value;
        }
        let var = &self.vars[id];
        if var.flags.is_reference || self.uses_symbol_table || is_superglobal(&var.name) {
            return ExprType::Value;
        }
        match flow.ty {
            ExprType::Unknown => ExprType::Value,
            ty => ty,
        }
    }

    pub fn assign_var(&mut self, id: VarId, ty: ExprType) {
        let var = &mut self.vars[id];
        var.flags.is_assigned = true;
        var.assigned_type = var.assigned_type.join(ty);
        self.flow[id] = FlowVar {
            assigned: Assigned::Definitely,
            ty,
        };
    }

    /// In-place mutation: element write, increment, by-reference argument
    pub fn set_modified(&mut self, id: VarId) {
        self.vars[id].flags.is_modified = true;
        // The variable may now hold anything, including a fresh array.
        self.flow[id] = FlowVar {
            assigned: Assigned::Definitely,
            ty: ExprType::Value,
        };
    }

    /// Address taken. Binding a reference creates the variable.
    pub fn set_reference(&mut self, id: VarId) {
        self.vars[id].flags.is_reference = true;
        self.flow[id] = FlowVar {
            assigned: Assigned::Definitely,
            ty: ExprType::Value,
        };
    }

    pub fn unset_var(&mut self, id: VarId) {
        self.vars[id].flags.is_unset = true;
        self.flow[id] = UNASSIGNED;
    }

    // ========== Temps and symbol table ==========

    /// Record a function-level temp variable name. Repeated names are
    /// recorded once.
    pub fn declare_temp_variable(&mut self, name: &str) {
        if !self.temps.iter().any(|t| t == name) {
            self.temps.push(name.to_string());
        }
    }

    /// Fresh `_l{n}` temp
    pub fn allocate_temp(&mut self) -> String {
        let name = format!("_l{}", self.temp_counter);
        self.temp_counter += 1;
        self.declare_temp_variable(&name);
        name
    }

    pub fn temps(&self) -> &[String] {
        &self.temps
    }

    /// Code in this function can read or write locals by name. Types
    /// learned so far no longer hold past this point.
    pub fn mark_uses_dynamic_symbol_table(&mut self) {
        self.uses_symbol_table = true;
        for flow in &mut self.flow {
            if flow.assigned != Assigned::Not {
                flow.ty = ExprType::Value;
            }
        }
    }

    pub fn uses_symbol_table(&self) -> bool {
        self.uses_symbol_table
    }

    // ========== Flow ==========

    pub fn save_flow(&self) -> FlowState {
        FlowState(self.flow.clone())
    }

    /// Install `state` and return the state it replaced. Variables
    /// declared after `state` was saved start unassigned.
    pub fn replace_flow(&mut self, state: FlowState) -> FlowState {
        let mut restored = state.0;
        restored.resize(self.vars.len(), UNASSIGNED);
        FlowState(std::mem::replace(&mut self.flow, restored))
    }

    /// Join the current state with `other`, as after two alternative
    /// paths.
    pub fn merge_flow(&mut self, other: &FlowState) {
        for (id, current) in self.flow.iter_mut().enumerate() {
            let alternative = other.0.get(id).copied().unwrap_or(UNASSIGNED);
            let assigned = if current.assigned == alternative.assigned {
                current.assigned
            } else {
                Assigned::Maybe
            };
            *current = FlowVar {
                assigned,
                ty: current.ty.join(alternative.ty),
            };
        }
    }

    // ========== Finish ==========

    /// Decide storage for every variable and freeze the facts.
    pub fn finish(self) -> FunctionFacts {
        let uses_symbol_table = self.uses_symbol_table;
        let mut vars = Vec::with_capacity(self.vars.len());
        let mut symbol_names = Vec::new();

        for var in self.vars {
            let mut flags = var.flags;
            let global = is_superglobal(&var.name);
            if uses_symbol_table && !global {
                flags.is_symbol_table_visible = true;
            }
            let storage = if global {
                Storage::Global
            } else if flags.is_symbol_table_visible {
                symbol_names.push(var.name.clone());
                Storage::Symbol(symbol_names.len() - 1)
            } else if flags.is_reference {
                Storage::Ref
            } else if !flags.is_modified
                && !flags.is_argument
                && !flags.read_unassigned
                && !flags.is_unset
                && var.assigned_type.is_raw_scalar()
            {
                Storage::Typed(var.assigned_type)
            } else {
                Storage::Value
            };
            vars.push(VarFacts {
                name: var.name,
                flags,
                assigned_type: var.assigned_type,
                storage,
            });
        }

        let facts = FunctionFacts {
            vars,
            index: self.index,
            temps: self.temps,
            uses_symbol_table,
            symbol_names,
        };
        if analyze_debug_enabled() {
            for var in facts.vars() {
                debug_log(format_args!(
                    "[analyze] ${}: {:?} {} type={}",
                    var.name, var.storage, var.flags, var.assigned_type
                ));
            }
        }
        facts
    }
}
