//! Minimal tree-walking interpreter for linked programs.
//!
//! Understands exactly the statement and expression forms the linker
//! emits, plus the three runtime helpers (`__access`, `__namespace`,
//! `__library`). Evaluation errors panic with the offending name,
//! which is what a test wants.

use mica_ast::{BinaryOp, Expr, Literal, ModuleItem, Node, Program, Stmt, UnaryOp};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Rc<Vec<Value>>),
    Object(Rc<HashMap<String, Value>>),
    Func(Rc<Closure>),
    Builtin(Rc<dyn Fn(&[Value]) -> Value>),
}

pub struct Closure {
    params: Vec<String>,
    body: Vec<Node<Stmt>>,
    env: Env,
}

impl Value {
    pub fn builtin(f: impl Fn(&[Value]) -> Value + 'static) -> Value {
        Value::Builtin(Rc::new(f))
    }

    pub fn object<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
        Value::Object(Rc::new(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ))
    }

    pub fn to_display(&self) -> String {
        match self {
            Value::Num(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Array(_) => "[array]".to_string(),
            Value::Object(_) => "[object]".to_string(),
            Value::Func(_) | Value::Builtin(_) => "[function]".to_string(),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}

pub type Env = Rc<RefCell<Scope>>;

#[derive(Debug)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Env>,
}

fn child_env(parent: &Env) -> Env {
    Rc::new(RefCell::new(Scope {
        vars: HashMap::new(),
        parent: Some(parent.clone()),
    }))
}

pub fn lookup(env: &Env, name: &str) -> Option<Value> {
    let scope = env.borrow();
    if let Some(value) = scope.vars.get(name) {
        return Some(value.clone());
    }
    scope.parent.as_ref().and_then(|p| lookup(p, name))
}

enum Flow {
    Normal,
    Return(Value),
}

pub struct Interp {
    libraries: HashMap<String, Value>,
}

impl Interp {
    pub fn new(libraries: HashMap<String, Value>) -> Self {
        Self { libraries }
    }

    /// Executes a linked program in a fresh global scope and returns
    /// that scope for inspection.
    pub fn run(&self, program: &Program) -> Env {
        let env: Env = Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: None,
        }));
        for item in &program.items {
            match &item.value {
                ModuleItem::Stmt(stmt) => {
                    self.exec(stmt, &env);
                }
                other => panic!("Unlinked module item survived linking: {:?}", other),
            }
        }
        env
    }

    fn exec(&self, stmt: &Node<Stmt>, env: &Env) -> Flow {
        match &stmt.value {
            Stmt::VarDecl(decl) => {
                let value = decl
                    .init
                    .as_ref()
                    .map(|init| self.eval(init, env))
                    .unwrap_or(Value::Null);
                env.borrow_mut().vars.insert(decl.name.value.name.clone(), value);
                Flow::Normal
            }
            Stmt::Function(func) => {
                let closure = Value::Func(Rc::new(Closure {
                    params: func.params.iter().map(|p| p.value.name.clone()).collect(),
                    body: func.body.clone(),
                    env: env.clone(),
                }));
                env.borrow_mut().vars.insert(func.name.value.name.clone(), closure);
                Flow::Normal
            }
            Stmt::Return(expr) => {
                let value = expr
                    .as_ref()
                    .map(|e| self.eval(e, env))
                    .unwrap_or(Value::Null);
                Flow::Return(value)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env).truthy() {
                    self.exec(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch, env)
                } else {
                    Flow::Normal
                }
            }
            Stmt::While { cond, body } => {
                while self.eval(cond, env).truthy() {
                    if let Flow::Return(value) = self.exec(body, env) {
                        return Flow::Return(value);
                    }
                }
                Flow::Normal
            }
            Stmt::Block(stmts) => {
                let scope = child_env(env);
                for stmt in stmts {
                    if let Flow::Return(value) = self.exec(stmt, &scope) {
                        return Flow::Return(value);
                    }
                }
                Flow::Normal
            }
            Stmt::Expr(expr) => {
                self.eval(expr, env);
                Flow::Normal
            }
        }
    }

    fn eval(&self, expr: &Node<Expr>, env: &Env) -> Value {
        match &expr.value {
            Expr::Literal(lit) => match lit {
                Literal::Number(n) => Value::Num(*n),
                Literal::String(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            },
            Expr::Ident(ident) => {
                lookup(env, &ident.name).unwrap_or_else(|| panic!("Unbound name {}", ident.name))
            }
            Expr::Array(elements) => Value::Array(Rc::new(
                elements.iter().map(|e| self.eval(e, env)).collect(),
            )),
            Expr::Call { callee, args } => self.eval_call(callee, args, env),
            Expr::Member { object, property } => {
                match self.eval(object, env) {
                    Value::Object(fields) => {
                        fields.get(&property.value.name).cloned().unwrap_or(Value::Null)
                    }
                    other => panic!(
                        "Member access .{} on non-object {:?}",
                        property.value.name, other
                    ),
                }
            }
            Expr::Index { object, index } => {
                match (self.eval(object, env), self.eval(index, env)) {
                    (Value::Array(elements), Value::Num(i)) => {
                        elements.get(i as usize).cloned().unwrap_or(Value::Null)
                    }
                    (Value::Object(fields), Value::Str(key)) => {
                        fields.get(&key).cloned().unwrap_or(Value::Null)
                    }
                    (object, index) => panic!("Bad index {:?}[{:?}]", object, index),
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, env);
                match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => match value {
                        Value::Num(n) => Value::Num(-n),
                        other => panic!("Negation of {:?}", other),
                    },
                }
            }
            Expr::Binary { op, left, right } => {
                // Short-circuit forms never evaluate the right side
                // eagerly.
                match op {
                    BinaryOp::And => {
                        let lhs = self.eval(left, env);
                        if lhs.truthy() {
                            self.eval(right, env)
                        } else {
                            lhs
                        }
                    }
                    BinaryOp::Or => {
                        let lhs = self.eval(left, env);
                        if lhs.truthy() {
                            lhs
                        } else {
                            self.eval(right, env)
                        }
                    }
                    _ => binary(*op, self.eval(left, env), self.eval(right, env)),
                }
            }
        }
    }

    fn eval_call(&self, callee: &Node<Expr>, args: &[Node<Expr>], env: &Env) -> Value {
        if let Expr::Ident(ident) = &callee.value {
            match ident.name.as_str() {
                "__library" => {
                    let name = match self.eval(&args[0], env) {
                        Value::Str(name) => name,
                        other => panic!("__library of {:?}", other),
                    };
                    return self
                        .libraries
                        .get(&name)
                        .cloned()
                        .unwrap_or_else(|| panic!("No library host for {}", name));
                }
                "__access" => {
                    let target = self.eval(&args[0], env);
                    let name = match self.eval(&args[1], env) {
                        Value::Str(name) => name,
                        other => panic!("__access by {:?}", other),
                    };
                    return access(&target, &name);
                }
                "__namespace" => {
                    return namespace(&self.eval(&args[0], env));
                }
                _ => {}
            }
        }

        let func = self.eval(callee, env);
        let values: Vec<Value> = args.iter().map(|a| self.eval(a, env)).collect();
        self.apply(&func, &values)
    }

    fn apply(&self, func: &Value, args: &[Value]) -> Value {
        match func {
            Value::Builtin(f) => f(args),
            Value::Func(closure) => {
                let scope = child_env(&closure.env);
                for (param, value) in closure.params.iter().zip(args) {
                    scope.borrow_mut().vars.insert(param.clone(), value.clone());
                }
                for stmt in &closure.body {
                    if let Flow::Return(value) = self.exec(stmt, &scope) {
                        return value;
                    }
                }
                Value::Null
            }
            other => panic!("Call of non-function {:?}", other),
        }
    }
}

/// Reads one export out of a unit result. Unit results are the packaged
/// `[default, [[name, value], ...]]` arrays; library results are plain
/// objects.
fn access(target: &Value, name: &str) -> Value {
    match target {
        Value::Object(fields) => fields.get(name).cloned().unwrap_or(Value::Null),
        Value::Array(parts) => {
            if name == "default" {
                return parts.first().cloned().unwrap_or(Value::Null);
            }
            if let Some(Value::Array(pairs)) = parts.get(1) {
                for pair in pairs.iter() {
                    if let Value::Array(entry) = pair {
                        if let (Some(Value::Str(key)), Some(value)) = (entry.first(), entry.get(1))
                        {
                            if key == name {
                                return value.clone();
                            }
                        }
                    }
                }
            }
            Value::Null
        }
        other => panic!("__access on {:?}", other),
    }
}

/// Builds a namespace object from a unit result or passes a library
/// object through.
fn namespace(target: &Value) -> Value {
    match target {
        Value::Object(_) => target.clone(),
        Value::Array(parts) => {
            let mut fields: HashMap<String, Value> = HashMap::new();
            if let Some(Value::Array(pairs)) = parts.get(1) {
                for pair in pairs.iter() {
                    if let Value::Array(entry) = pair {
                        if let (Some(Value::Str(key)), Some(value)) = (entry.first(), entry.get(1))
                        {
                            fields.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            match parts.first() {
                Some(Value::Null) | None => {}
                Some(default) => {
                    fields.insert("default".to_string(), default.clone());
                }
            }
            Value::Object(Rc::new(fields))
        }
        other => panic!("__namespace on {:?}", other),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Value {
    use BinaryOp::*;
    match (op, &lhs, &rhs) {
        (Add, Value::Num(a), Value::Num(b)) => Value::Num(a + b),
        (Add, Value::Str(a), b) => Value::Str(format!("{}{}", a, b.to_display())),
        (Add, a, Value::Str(b)) => Value::Str(format!("{}{}", a.to_display(), b)),
        (Sub, Value::Num(a), Value::Num(b)) => Value::Num(a - b),
        (Mul, Value::Num(a), Value::Num(b)) => Value::Num(a * b),
        (Div, Value::Num(a), Value::Num(b)) => Value::Num(a / b),
        (Lt, Value::Num(a), Value::Num(b)) => Value::Bool(a < b),
        (Gt, Value::Num(a), Value::Num(b)) => Value::Bool(a > b),
        (LtEq, Value::Num(a), Value::Num(b)) => Value::Bool(a <= b),
        (GtEq, Value::Num(a), Value::Num(b)) => Value::Bool(a >= b),
        (Eq, a, b) => Value::Bool(values_eq(a, b)),
        (NotEq, a, b) => Value::Bool(!values_eq(a, b)),
        (op, a, b) => panic!("Bad operands for {}: {:?} and {:?}", op, a, b),
    }
}

fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}
