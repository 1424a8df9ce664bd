/// Formats a double as a JSON number.
///
/// Integral values below 1e15 print without a fraction. Other finite values
/// use the shortest representation that parses back to the same double.
/// JSON cannot express NaN or infinities, so those print as `null`.
pub(crate) fn format_number(n: f64) -> String {
    if !n.is_finite() {
        "null".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(|num| num.to_string())
            .unwrap_or_else(|| "null".to_string())
    }
}
