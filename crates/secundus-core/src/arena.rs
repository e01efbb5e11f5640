//! Arena allocator for expression storage.
//!
//! All expression nodes live contiguously in a `Vec`, with hash-consing
//! ensuring each structurally unique expression is stored exactly once.
//! Handles are 32-bit indices, so structural equality is an integer compare.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::expr::{ExprHandle, ExprNode, Func, SymbolId};

/// The main arena for storing expressions.
#[derive(Debug, Default)]
pub struct ExprArena {
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Interning table: maps node content to its handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Symbol table: maps symbol names to their IDs.
    symbols: HashMap<String, SymbolId>,
    /// Reverse symbol table for display.
    symbol_names: Vec<String>,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an expression node, returning its handle.
    ///
    /// If an identical node already exists, returns the existing handle.
    ///
    /// # Panics
    ///
    /// Panics if the arena holds more than `u32::MAX` nodes.
    pub fn intern(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }

        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "arena capacity exceeded");

        #[allow(clippy::cast_possible_truncation)]
        let handle = ExprHandle::new(index as u32);
        self.nodes.push(node.clone());
        self.intern_map.insert(node, handle);
        handle
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle did not come from this arena.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        &self.nodes[handle.index() as usize]
    }

    /// Interns a symbol name, returning its unique ID.
    pub fn intern_symbol(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.symbols.get(name) {
            return id;
        }

        #[allow(clippy::cast_possible_truncation)]
        let id = self.symbol_names.len() as SymbolId;
        self.symbols.insert(name.to_string(), id);
        self.symbol_names.push(name.to_string());
        id
    }

    /// Gets the ID of an already-interned symbol.
    #[must_use]
    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    /// Gets the name of a symbol by its ID.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbol_names.get(id as usize).map(String::as_str)
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Convenience constructors ===

    /// Creates an integer literal.
    pub fn integer(&mut self, value: i64) -> ExprHandle {
        self.intern(ExprNode::Integer(value))
    }

    /// Creates a numeric literal, preferring the integer representation
    /// when the value is integral.
    pub fn number(&mut self, value: f64) -> ExprHandle {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            self.integer(value as i64)
        } else {
            self.intern(ExprNode::Float(value.to_bits()))
        }
    }

    /// Creates a symbol expression.
    pub fn symbol(&mut self, name: &str) -> ExprHandle {
        let id = self.intern_symbol(name);
        self.intern(ExprNode::Symbol(id))
    }

    /// Creates an addition expression.
    pub fn add(&mut self, args: impl Into<SmallVec<[ExprHandle; 4]>>) -> ExprHandle {
        let args = args.into();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(ExprNode::Add(args))
    }

    /// Creates a multiplication expression.
    pub fn mul(&mut self, args: impl Into<SmallVec<[ExprHandle; 4]>>) -> ExprHandle {
        let args = args.into();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(ExprNode::Mul(args))
    }

    /// Creates a power expression.
    pub fn pow(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Pow { base, exp })
    }

    /// Creates a negation expression.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Neg(arg))
    }

    /// Creates a division expression.
    pub fn div(&mut self, num: ExprHandle, den: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Div { num, den })
    }

    /// Creates a function application.
    pub fn func(&mut self, func: Func, arg: ExprHandle) -> ExprHandle {
        self.intern(ExprNode::Function { func, arg })
    }

    // === Folding constructors ===
    //
    // Used by differentiation so that derivatives come out without the
    // 0- and 1-noise the raw product/chain rules produce. This is constant
    // and identity folding only, not general simplification.

    /// Numeric value of a handle, if it references a literal or a negated
    /// literal (the parser produces `Neg(2)` for `-2`).
    #[must_use]
    pub fn number_of(&self, handle: ExprHandle) -> Option<f64> {
        match self.get(handle) {
            ExprNode::Neg(inner) => self.get(*inner).number().map(|v| -v),
            node => node.number(),
        }
    }

    /// Collects `handle` into `out`, inlining nested sums.
    fn collect_add(&self, handle: ExprHandle, out: &mut Vec<ExprHandle>) {
        if let ExprNode::Add(args) = self.get(handle) {
            for arg in args.clone() {
                self.collect_add(arg, out);
            }
        } else {
            out.push(handle);
        }
    }

    /// Collects `handle` into `out`, inlining nested products.
    fn collect_mul(&self, handle: ExprHandle, out: &mut Vec<ExprHandle>) {
        if let ExprNode::Mul(args) = self.get(handle) {
            for arg in args.clone() {
                self.collect_mul(arg, out);
            }
        } else {
            out.push(handle);
        }
    }

    /// Sum with identity folding: nested sums are flattened, zeros dropped,
    /// numeric literals merged.
    pub fn add_folded(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let mut flat = Vec::new();
        for arg in args {
            self.collect_add(arg, &mut flat);
        }

        let mut terms: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        let mut constant = 0.0;
        for arg in flat {
            match self.number_of(arg) {
                Some(v) => constant += v,
                None => terms.push(arg),
            }
        }
        if constant != 0.0 {
            terms.push(self.number(constant));
        }
        match terms.len() {
            0 => self.integer(0),
            1 => terms[0],
            _ => self.intern(ExprNode::Add(terms)),
        }
    }

    /// Product with identity folding: nested products are flattened, ones
    /// dropped, a zero factor collapses the whole product, numeric literals
    /// merged.
    pub fn mul_folded(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let mut flat = Vec::new();
        for arg in args {
            self.collect_mul(arg, &mut flat);
        }

        let mut factors: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        let mut constant = 1.0;
        for arg in flat {
            match self.number_of(arg) {
                Some(v) if v == 0.0 => return self.integer(0),
                Some(v) => constant *= v,
                None => factors.push(arg),
            }
        }
        if constant == -1.0 && !factors.is_empty() {
            let product = match factors.len() {
                1 => factors[0],
                _ => self.intern(ExprNode::Mul(factors)),
            };
            return self.neg_folded(product);
        }
        if constant != 1.0 {
            factors.insert(0, self.number(constant));
        }
        match factors.len() {
            0 => self.integer(1),
            1 => factors[0],
            _ => self.intern(ExprNode::Mul(factors)),
        }
    }

    /// Power with identity folding: `x^0 = 1`, `x^1 = x`, `0^e = 0`, `1^e = 1`.
    pub fn pow_folded(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        if self.get(exp).is_number(0.0) {
            return self.integer(1);
        }
        if self.get(exp).is_number(1.0) {
            return base;
        }
        if self.get(base).is_number(0.0) || self.get(base).is_number(1.0) {
            return base;
        }
        self.pow(base, exp)
    }

    /// Negation with folding: literals negate in place, `-(-x) = x`.
    pub fn neg_folded(&mut self, arg: ExprHandle) -> ExprHandle {
        if let Some(v) = self.number_of(arg) {
            return self.number(-v);
        }
        if let ExprNode::Neg(inner) = self.get(arg) {
            return *inner;
        }
        self.neg(arg)
    }

    /// Division with folding: `0/x = 0`, `x/1 = x`, literal quotients and
    /// integral leading coefficients fold numerically.
    pub fn div_folded(&mut self, num: ExprHandle, den: ExprHandle) -> ExprHandle {
        if self.get(num).is_number(0.0) {
            return self.integer(0);
        }
        if self.get(den).is_number(1.0) {
            return num;
        }
        if let Some(d) = self.number_of(den) {
            if d != 0.0 {
                if let Some(n) = self.number_of(num) {
                    let quotient = n / d;
                    if quotient.fract() == 0.0 {
                        return self.number(quotient);
                    }
                }
                // fold the denominator into a product's leading literal,
                // but only when the quotient stays exact
                if let ExprNode::Mul(args) = self.get(num).clone() {
                    if let Some(k) = self.number_of(args[0]) {
                        let coeff = k / d;
                        if coeff.fract() == 0.0 {
                            let lead = self.number(coeff);
                            return self
                                .mul_folded(std::iter::once(lead).chain(args[1..].iter().copied()));
                        }
                    }
                }
            }
        }
        self.div(num, den)
    }
}
