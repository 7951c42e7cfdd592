//! Date and time functions.

use super::{expect_arity, CallError, CallResult, Category, FunctionSpec, ParamType, Params, Value};
use polars::prelude::{duration, lit, DurationArgs, Expr, StrptimeOptions};

const UNARY: Params = Params::Fixed(&[ParamType::Any]);
const BINARY: Params = Params::Fixed(&[ParamType::Any, ParamType::Any]);

pub(super) fn register(registry: &mut super::FunctionRegistry) {
    registry.register(FunctionSpec {
        name: "now",
        category: Category::Date,
        params: Params::Fixed(&[]),
        doc: "The current timestamp.",
        callable: now,
    });
    registry.register(FunctionSpec {
        name: "today",
        category: Category::Date,
        params: Params::Fixed(&[]),
        doc: "The current date.",
        callable: today,
    });
    let extractors: [(&'static str, &'static str, super::Callable); 6] = [
        ("year", "Extract the year from a date.", year),
        ("month", "Extract the month from a date.", month),
        ("day", "Extract the day of the month from a date.", day),
        ("hour", "Extract the hour from a timestamp.", hour),
        ("minute", "Extract the minute from a timestamp.", minute),
        ("second", "Extract the second from a timestamp.", second),
    ];
    for (name, doc, callable) in extractors {
        registry.register(FunctionSpec {
            name,
            category: Category::Date,
            params: UNARY,
            doc,
            callable,
        });
    }
    let adders: [(&'static str, &'static str, super::Callable); 4] = [
        ("add_days", "Add a number of days to a date.", add_days),
        ("add_hours", "Add a number of hours to a timestamp.", add_hours),
        ("add_minutes", "Add a number of minutes to a timestamp.", add_minutes),
        ("add_seconds", "Add a number of seconds to a timestamp.", add_seconds),
    ];
    for (name, doc, callable) in adders {
        registry.register(FunctionSpec {
            name,
            category: Category::Date,
            params: BINARY,
            doc,
            callable,
        });
    }
    registry.register(FunctionSpec {
        name: "add_years",
        category: Category::Date,
        params: Params::Fixed(&[ParamType::Any, ParamType::Integer]),
        doc: "Add a number of calendar years to a date.",
        callable: add_years,
    });
    registry.register(FunctionSpec {
        name: "date_diff_days",
        category: Category::Date,
        params: BINARY,
        doc: "Difference between two dates in whole days.",
        callable: date_diff_days,
    });
    registry.register(FunctionSpec {
        name: "datetime_diff_seconds",
        category: Category::Date,
        params: BINARY,
        doc: "Difference between two timestamps in seconds.",
        callable: datetime_diff_seconds,
    });
    registry.register(FunctionSpec {
        name: "datetime_diff_nanoseconds",
        category: Category::Date,
        params: BINARY,
        doc: "Difference between two timestamps in nanoseconds.",
        callable: datetime_diff_nanoseconds,
    });
    registry.register(FunctionSpec {
        name: "to_date",
        category: Category::Date,
        params: UNARY,
        doc: "Parse a string as a date.",
        callable: to_date,
    });
}

/// Lift a value into a date expression; raw strings are parsed.
fn date_expr(v: Value) -> Expr {
    match v {
        Value::Expr(e) => e,
        Value::Str(s) => lit(s.as_str()).str().to_date(StrptimeOptions::default()),
        other => other.into_expr(),
    }
}

/// Lift a value into a datetime expression; raw strings are parsed.
fn datetime_expr(v: Value) -> Expr {
    match v {
        Value::Expr(e) => e,
        Value::Str(s) => lit(s.as_str()).str().to_datetime(
            None,
            None,
            StrptimeOptions::default(),
            lit("raise"),
        ),
        other => other.into_expr(),
    }
}

fn now(args: Vec<Value>) -> CallResult {
    expect_arity(&args, 0, "now")?;
    Ok(Value::Expr(lit(chrono::Local::now().naive_local())))
}

fn today(args: Vec<Value>) -> CallResult {
    expect_arity(&args, 0, "today")?;
    Ok(Value::Expr(lit(chrono::Local::now().date_naive())))
}

fn extract(mut args: Vec<Value>, name: &str, f: fn(Expr) -> Expr, with_time: bool) -> CallResult {
    expect_arity(&args, 1, name)?;
    let arg = args.remove(0);
    let e = if with_time {
        datetime_expr(arg)
    } else {
        date_expr(arg)
    };
    Ok(Value::Expr(f(e)))
}

fn year(args: Vec<Value>) -> CallResult {
    extract(args, "year", |e| e.dt().year(), false)
}

fn month(args: Vec<Value>) -> CallResult {
    extract(args, "month", |e| e.dt().month(), false)
}

fn day(args: Vec<Value>) -> CallResult {
    extract(args, "day", |e| e.dt().day(), false)
}

fn hour(args: Vec<Value>) -> CallResult {
    extract(args, "hour", |e| e.dt().hour(), true)
}

fn minute(args: Vec<Value>) -> CallResult {
    extract(args, "minute", |e| e.dt().minute(), true)
}

fn second(args: Vec<Value>) -> CallResult {
    extract(args, "second", |e| e.dt().second(), true)
}

fn add_duration(
    mut args: Vec<Value>,
    name: &str,
    f: fn(DurationArgs, Expr) -> DurationArgs,
) -> CallResult {
    expect_arity(&args, 2, name)?;
    let amount = args.pop().expect("arity checked").into_expr();
    let base = date_expr(args.pop().expect("arity checked"));
    Ok(Value::Expr(base + duration(f(DurationArgs::new(), amount))))
}

fn add_days(args: Vec<Value>) -> CallResult {
    add_duration(args, "add_days", |d, e| d.with_days(e))
}

fn add_hours(args: Vec<Value>) -> CallResult {
    add_duration(args, "add_hours", |d, e| d.with_hours(e))
}

fn add_minutes(args: Vec<Value>) -> CallResult {
    add_duration(args, "add_minutes", |d, e| d.with_minutes(e))
}

fn add_seconds(args: Vec<Value>) -> CallResult {
    add_duration(args, "add_seconds", |d, e| d.with_seconds(e))
}

fn add_years(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "add_years")?;
    let years = match args.pop().expect("arity checked") {
        Value::Int(n) => n,
        other => {
            return Err(CallError::invalid(format!(
                "add_years amount must be an integer literal, got {}",
                other.type_name()
            )))
        }
    };
    let base = date_expr(args.pop().expect("arity checked"));
    Ok(Value::Expr(base.dt().offset_by(lit(format!("{years}y")))))
}

fn date_diff_days(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "date_diff_days")?;
    let rhs = date_expr(args.pop().expect("arity checked"));
    let lhs = date_expr(args.pop().expect("arity checked"));
    Ok(Value::Expr((lhs - rhs).dt().total_days()))
}

fn datetime_diff_seconds(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "datetime_diff_seconds")?;
    let rhs = datetime_expr(args.pop().expect("arity checked"));
    let lhs = datetime_expr(args.pop().expect("arity checked"));
    Ok(Value::Expr((lhs - rhs).dt().total_seconds()))
}

fn datetime_diff_nanoseconds(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "datetime_diff_nanoseconds")?;
    let rhs = datetime_expr(args.pop().expect("arity checked"));
    let lhs = datetime_expr(args.pop().expect("arity checked"));
    Ok(Value::Expr((lhs - rhs).dt().total_nanoseconds()))
}

fn to_date(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "to_date")?;
    Ok(Value::Expr(
        args.remove(0)
            .into_expr()
            .str()
            .to_date(StrptimeOptions::default()),
    ))
}
