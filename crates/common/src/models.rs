//! Common data models for Triton Packager
//!
//! This module defines the hint types forwarded to the external pipeline
//! loading routine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric precision a pipeline is loaded with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Precision {
    /// Full precision (FP32)
    FP32,
    /// Half precision (FP16)
    FP16,
    /// Brain floating point (BF16)
    BF16,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::FP32 => write!(f, "fp32"),
            Precision::FP16 => write!(f, "fp16"),
            Precision::BF16 => write!(f, "bf16"),
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fp32" | "float32" => Ok(Precision::FP32),
            "fp16" | "float16" => Ok(Precision::FP16),
            "bf16" | "bfloat16" => Ok(Precision::BF16),
            _ => Err(format!("Unknown precision: {}", s)),
        }
    }
}

/// Device a pipeline is placed on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Device {
    /// CPU
    CPU,
    /// CUDA GPU with device ordinal
    CUDA(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::CPU => write!(f, "cpu"),
            Device::CUDA(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if lower == "cpu" {
            return Ok(Device::CPU);
        }
        if lower == "cuda" {
            return Ok(Device::CUDA(0));
        }
        if let Some(ordinal) = lower.strip_prefix("cuda:") {
            return ordinal
                .parse()
                .map(Device::CUDA)
                .map_err(|_| format!("Invalid CUDA ordinal: {}", s));
        }
        Err(format!("Unknown device: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_round_trip() {
        assert_eq!("fp16".parse::<Precision>().unwrap(), Precision::FP16);
        assert_eq!("float32".parse::<Precision>().unwrap(), Precision::FP32);
        assert_eq!(Precision::BF16.to_string(), "bf16");
        assert!("int8".parse::<Precision>().is_err());
    }

    #[test]
    fn test_device_round_trip() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::CPU);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::CUDA(0));
        assert_eq!("cuda:1".parse::<Device>().unwrap(), Device::CUDA(1));
        assert_eq!(Device::CUDA(2).to_string(), "cuda:2");
        assert!("tpu".parse::<Device>().is_err());
    }
}
