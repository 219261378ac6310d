//! Morning check-in answers.

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Terrible,
    Poor,
    Ok,
    Good,
    Great,
}

impl SleepQuality {
    /// 1..=9 on an odd scale; `Ok` sits at the midpoint 5.
    pub fn score(&self) -> i32 {
        match self {
            SleepQuality::Terrible => 1,
            SleepQuality::Poor => 3,
            SleepQuality::Ok => 5,
            SleepQuality::Good => 7,
            SleepQuality::Great => 9,
        }
    }
}

impl std::str::FromStr for SleepQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terrible" => Ok(SleepQuality::Terrible),
            "poor" => Ok(SleepQuality::Poor),
            "ok" => Ok(SleepQuality::Ok),
            "good" => Ok(SleepQuality::Good),
            "great" => Ok(SleepQuality::Great),
            other => Err(format!(
                "unknown sleep quality '{other}' (expected terrible|poor|ok|good|great)"
            )),
        }
    }
}

/// Immutable input to one planning run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorningContext {
    pub sleep: SleepQuality,
    pub hours_available: f64,
    /// 1-10.
    pub energy: i32,
}

impl MorningContext {
    pub fn new(sleep: SleepQuality, hours_available: f64, energy: i32) -> Self {
        Self {
            sleep,
            hours_available,
            energy,
        }
    }

    pub fn available_minutes(&self) -> i32 {
        (self.hours_available * 60.0).round() as i32
    }

    /// Low-energy days earn multiplied points.
    pub fn is_low_energy(&self) -> bool {
        self.energy <= 3 || self.sleep == SleepQuality::Terrible
    }

    pub fn validate(&self) -> Result<(), ContextError> {
        if !(1..=10).contains(&self.energy) {
            return Err(ContextError::EnergyOutOfRange(self.energy));
        }
        if !self.hours_available.is_finite() || self.hours_available < 0.0 {
            return Err(ContextError::InvalidHours(self.hours_available));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_scores_and_parsing() {
        assert_eq!(SleepQuality::Terrible.score(), 1);
        assert_eq!(SleepQuality::Great.score(), 9);
        assert_eq!("Good".parse::<SleepQuality>().unwrap(), SleepQuality::Good);
        assert!("meh".parse::<SleepQuality>().is_err());
    }

    #[test]
    fn minutes_and_validation() {
        let ctx = MorningContext::new(SleepQuality::Ok, 7.5, 6);
        assert_eq!(ctx.available_minutes(), 450);
        ctx.validate().unwrap();

        assert!(MorningContext::new(SleepQuality::Ok, 8.0, 0).validate().is_err());
        assert!(MorningContext::new(SleepQuality::Ok, -1.0, 5).validate().is_err());
    }

    #[test]
    fn low_energy_flag() {
        assert!(MorningContext::new(SleepQuality::Great, 8.0, 3).is_low_energy());
        assert!(MorningContext::new(SleepQuality::Terrible, 8.0, 8).is_low_energy());
        assert!(!MorningContext::new(SleepQuality::Poor, 8.0, 4).is_low_energy());
    }
}
