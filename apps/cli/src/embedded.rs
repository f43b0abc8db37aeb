//! Embedded YAML configs so the CLI runs without an assets directory.
//! Provides stable names looked up by `get_yaml(name)`.

#[inline]
pub fn get_yaml(name: &str) -> Option<&'static str> {
    match name {
        "baseline" => Some(include_str!("../../../assets/scenarios/baseline.yaml")),
        "high_ctr" => Some(include_str!("../../../assets/scenarios/high_ctr.yaml")),
        _ => None,
    }
}
