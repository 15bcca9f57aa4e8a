use crate::GlobalOpts;
use colored::Colorize;
use eqr_codec::{IntermediateRepresentation, Tag};
use eqr_runtime::{
    available_tags, primary_tag, validate_payload, ExerciseInstance, ExerciseReport, Session,
    SessionConfig,
};
use eqr_vm::{compile, Bindings, Evaluation, Vm};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};

// ── input ───────────────────────────────────────────────────────

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    if path == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("read stdin: {e}"))?;
        Ok(buf)
    } else {
        fs::read(path).map_err(|e| format!("read payload: {e}"))
    }
}

/// Hex text may contain whitespace and line breaks.
fn decode_hex_text(raw: &[u8]) -> Result<Vec<u8>, String> {
    let text: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(text).map_err(|e| format!("hex payload: {e}"))
}

fn load_payload(opts: &GlobalOpts, path: &str) -> Result<Vec<u8>, String> {
    let raw = read_input(path)?;
    if opts.hex {
        decode_hex_text(&raw)
    } else {
        Ok(raw)
    }
}

fn load_config(opts: &GlobalOpts) -> Result<SessionConfig, String> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
            SessionConfig::from_json(&text).map_err(|e| format!("parse config: {e}"))?
        }
        None => SessionConfig::default(),
    };
    if let Some(limit) = opts.step_limit {
        cfg.vm.step_limit = limit;
    }
    Ok(cfg)
}

fn rng(opts: &GlobalOpts) -> StdRng {
    match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn open_session(opts: &GlobalOpts, path: &str) -> Result<Session, String> {
    let cfg = load_config(opts)?;
    let bytes = load_payload(opts, path)?;
    let ir = validate_payload(&bytes, &cfg.decoder).map_err(|e| e.to_string())?;
    Ok(Session::new(ir, cfg))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
    println!("{text}");
    Ok(())
}

pub fn parse_var(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("missing '=' in {s}"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("parse {name}: {e}"))?;
    Ok((name.trim().to_string(), value))
}

// ── decode ──────────────────────────────────────────────────────

pub fn decode(opts: &GlobalOpts, path: &str) -> Result<(), String> {
    let cfg = load_config(opts)?;
    let bytes = load_payload(opts, path)?;
    let ir = validate_payload(&bytes, &cfg.decoder).map_err(|e| e.to_string())?;
    if opts.json {
        return print_json(&ir);
    }
    print_ir(&ir);
    Ok(())
}

fn print_ir(ir: &IntermediateRepresentation) {
    if !ir.labels.is_empty() {
        println!("{}", "Labels:".bold());
        for (kind, text) in &ir.labels {
            println!("  {:<14} {}", kind.to_string().blue(), text);
        }
    }
    if !ir.rand_generators.is_empty() {
        println!("{}", "Variables:".bold());
        for (name, range) in &ir.rand_generators {
            println!("  {:<14} [{}, {}]", name.cyan(), range.min, range.max);
        }
    }
    if !ir.solutions.is_empty() {
        println!("{}", "Solutions:".bold());
        for (i, s) in ir.solutions.iter().enumerate() {
            println!("  {} {} {}", format!("#{}", i + 1).dimmed(), s.question, tag_list(&s.tags));
            println!("     {}", s.steps.dimmed());
        }
    }
    if !ir.exercises.is_empty() {
        println!("{}", "Exercises:".bold());
        for (i, e) in ir.exercises.iter().enumerate() {
            println!("  {} {} {}", format!("#{}", i + 1).dimmed(), e.expression, tag_list(&e.tags));
        }
    }
    let offered: Vec<String> = available_tags(&ir.solutions)
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("{} {}", "Practice:".dimmed(), offered.join(", "));
}

fn tag_list(tags: &[Tag]) -> String {
    let names: Vec<String> = tags.iter().map(ToString::to_string).collect();
    let mut out = format!("[{}]", names.join(", ")).dimmed().to_string();
    if let Some(primary) = primary_tag(tags) {
        out.push_str(&format!(" {}", format!("→ {primary}").dimmed()));
    }
    out
}

// ── run ─────────────────────────────────────────────────────────

pub fn run(opts: &GlobalOpts, path: &str) -> Result<(), String> {
    let mut session = open_session(opts, path)?;
    session.initialize_variables(&mut rng(opts));
    let reports = session.execute_exercises();
    if opts.json {
        return print_json(&serde_json::json!({
            "variables": session.variables(),
            "reports": reports,
        }));
    }

    for (name, value) in session.variables() {
        println!("{} {} = {}", "var".dimmed(), name.cyan(), value);
    }
    for r in &reports {
        print_report(r);
    }
    Ok(())
}

fn print_report(r: &ExerciseReport) {
    let badge = if r.is_valid { "OK".green().bold() } else { "ERR".red().bold() };
    println!();
    println!("{} {} {}", format!("#{}", r.id).bold(), badge, r.original_expression);
    if r.substituted_expression != r.original_expression {
        println!("  {} {}", "as    ".dimmed(), r.substituted_expression);
    }
    match (&r.evaluation, &r.error) {
        (Some(Evaluation::Expression { value }), _) => {
            println!("  {} {}", "value ".dimmed(), value.to_string().cyan())
        }
        (Some(Evaluation::Equation { is_equal }), _) => {
            println!("  {} {}", "equal ".dimmed(), is_equal.to_string().cyan())
        }
        (None, Some(err)) => println!("  {} {}", "error ".dimmed(), err.red()),
        (None, None) => {}
    }
    println!("  {} {} {:?}", "steps ".dimmed(), r.steps, r.final_stack);
    if let Some(code) = &r.disassembly {
        for line in code.lines() {
            println!("    {}", line.dimmed());
        }
    }
}

// ── exercises ───────────────────────────────────────────────────

pub fn exercises(opts: &GlobalOpts, path: &str, tag: Tag) -> Result<(), String> {
    let mut session = open_session(opts, path)?;
    let instances = session.exercises_by_tag(&BTreeSet::from([tag]), &mut rng(opts));
    if opts.json {
        return print_json(&instances);
    }
    if instances.is_empty() {
        println!("{}", format!("No exercises for {tag}.").dimmed());
        return Ok(());
    }
    for inst in &instances {
        print_instance(inst);
    }
    Ok(())
}

fn print_instance(inst: &ExerciseInstance) {
    let shown = inst
        .question_text
        .as_deref()
        .unwrap_or(inst.math_expression.as_str());
    println!("{} {}", format!("#{}", inst.id).bold(), shown);
    println!("   {} {}", "compute".dimmed(), inst.math_expression.cyan());
}

// ── check ───────────────────────────────────────────────────────

pub fn check(opts: &GlobalOpts, path: &str, tag: Tag, index: usize, answer: f64) -> Result<(), String> {
    let mut session = open_session(opts, path)?;
    let instances = session.exercises_by_tag(&BTreeSet::from([tag]), &mut rng(opts));
    let inst = instances
        .iter()
        .find(|i| i.id == index)
        .ok_or_else(|| format!("no exercise with id {index} for {tag} ({} generated)", instances.len()))?;

    let result = session.verify_answer(answer, inst);
    if opts.json {
        return print_json(&serde_json::json!({
            "exercise": inst,
            "result": result,
        }));
    }

    print_instance(inst);
    if result.is_correct {
        println!("{} {}", "CORRECT".green().bold(), result.correct_answer);
    } else if let Some(err) = &result.error {
        println!("{} {}", "FAILED".red().bold(), err);
    } else {
        println!(
            "{} expected {}, got {}",
            "WRONG".yellow().bold(),
            result.correct_answer,
            result.user_answer
        );
    }
    Ok(())
}

// ── eval ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EvalOutput<'a> {
    source: &'a str,
    is_equation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation: Option<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    steps: u64,
    final_stack: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disassembly: Option<String>,
}

pub fn eval(opts: &GlobalOpts, expr: &str, vars: &[(String, f64)], disasm: bool) -> Result<(), String> {
    let cfg = load_config(opts)?;
    let program = compile(expr).map_err(|e| format!("compile: {e}"))?;
    let bindings: Bindings = vars.iter().cloned().collect();
    let run = Vm::new(cfg.vm).execute(&program, &bindings);

    let out = EvalOutput {
        source: expr,
        is_equation: program.meta.is_equation,
        evaluation: run.result.as_ref().ok().copied(),
        error: run.error().map(ToString::to_string),
        steps: run.steps,
        final_stack: run.final_stack.clone(),
        disassembly: disasm.then(|| program.disassemble()),
    };
    if opts.json {
        return print_json(&out);
    }

    if let Some(code) = &out.disassembly {
        println!("{code}");
    }
    match (out.evaluation, &out.error) {
        (Some(Evaluation::Expression { value }), _) => println!("{}", value.to_string().cyan()),
        (Some(Evaluation::Equation { is_equal }), _) => println!("{}", is_equal.to_string().cyan()),
        (None, err) => {
            return Err(format!(
                "evaluation failed after {} steps: {}",
                out.steps,
                err.as_deref().unwrap_or("unknown error")
            ))
        }
    }
    Ok(())
}
