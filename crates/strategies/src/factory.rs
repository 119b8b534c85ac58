use crate::Strategy;
use crate::buy_and_hold::BuyAndHold;
use crate::covered_call::CoveredCall;
use crate::delta_neutral::DeltaNeutral;
use crate::error::StrategyError;
use crate::leveraged_covered_call::LeveragedCoveredCall;
use crate::rnd_strategy::RndStrategy;
use crate::wheel::Wheel;
use serde_json::Value;

/// Creates a strategy instance from its type tag and a concrete parameter
/// document.
///
/// The document is the fully expanded configuration object for one variant;
/// each strategy deserializes the fields it cares about and ignores the rest.
/// Unknown tags are a configuration error, the run never starts.
pub fn create_strategy(name: &str, params: &Value) -> Result<Box<dyn Strategy>, StrategyError> {
    match name.to_lowercase().as_str() {
        "buyandhold" => Ok(Box::new(BuyAndHold::new())),
        "coveredcall" => Ok(Box::new(CoveredCall::new(serde_json::from_value(
            params.clone(),
        )?))),
        "wheel" => Ok(Box::new(Wheel::new(serde_json::from_value(
            params.clone(),
        )?))),
        "leveragedcoveredcall" => Ok(Box::new(LeveragedCoveredCall::new(
            serde_json::from_value(params.clone())?,
        ))),
        "deltaneutral" => Ok(Box::new(DeltaNeutral::new(serde_json::from_value(
            params.clone(),
        )?))),
        "rndstrategy" => Ok(Box::new(RndStrategy::new(serde_json::from_value(
            params.clone(),
        )?))),
        other => Err(StrategyError::UnknownStrategy(other.to_string())),
    }
}
