use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

pub type HashSet<K> = FxHashSet<K>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronType {
    Inhibitory,
    Excitatory,
}

impl NeuronType {
    pub fn code(self) -> i32 {
        match self {
            NeuronType::Inhibitory => 1,
            NeuronType::Excitatory => 2,
        }
    }
}

/// Connection type, named pre then post: `IE` runs from an inhibitory to an
/// excitatory neuron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynapseType {
    II,
    IE,
    EI,
    EE,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StpConstants {
    pub u: f32,
    pub d: f32,
    pub f: f32,
    pub tau: f32,
    pub delay: f32,
}

impl SynapseType {
    pub fn between(pre: NeuronType, post: NeuronType) -> Self {
        match (pre, post) {
            (NeuronType::Inhibitory, NeuronType::Inhibitory) => SynapseType::II,
            (NeuronType::Inhibitory, NeuronType::Excitatory) => SynapseType::IE,
            (NeuronType::Excitatory, NeuronType::Inhibitory) => SynapseType::EI,
            (NeuronType::Excitatory, NeuronType::Excitatory) => SynapseType::EE,
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            SynapseType::II | SynapseType::IE => -1.0,
            SynapseType::EI | SynapseType::EE => 1.0,
        }
    }

    pub fn stp_constants(self) -> StpConstants {
        match self {
            SynapseType::II => StpConstants {
                u: 0.32,
                d: 0.144,
                f: 0.06,
                tau: 6e-3,
                delay: 0.8e-3,
            },
            SynapseType::IE => StpConstants {
                u: 0.25,
                d: 0.7,
                f: 0.02,
                tau: 6e-3,
                delay: 0.8e-3,
            },
            SynapseType::EI => StpConstants {
                u: 0.05,
                d: 0.125,
                f: 1.2,
                tau: 3e-3,
                delay: 0.8e-3,
            },
            SynapseType::EE => StpConstants {
                u: 0.5,
                d: 1.1,
                f: 0.05,
                tau: 3e-3,
                delay: 1.5e-3,
            },
        }
    }

    pub fn code(self) -> i32 {
        match self {
            SynapseType::II => 0,
            SynapseType::IE => 1,
            SynapseType::EI => 2,
            SynapseType::EE => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SynapseType::II),
            1 => Some(SynapseType::IE),
            2 => Some(SynapseType::EI),
            3 => Some(SynapseType::EE),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synapse_type_from_pre_post() {
        use NeuronType::*;
        assert_eq!(SynapseType::between(Inhibitory, Inhibitory), SynapseType::II);
        assert_eq!(SynapseType::between(Inhibitory, Excitatory), SynapseType::IE);
        assert_eq!(SynapseType::between(Excitatory, Inhibitory), SynapseType::EI);
        assert_eq!(SynapseType::between(Excitatory, Excitatory), SynapseType::EE);
    }

    #[test]
    fn inhibitory_sources_have_negative_sign() {
        assert_eq!(SynapseType::II.sign(), -1.0);
        assert_eq!(SynapseType::IE.sign(), -1.0);
        assert_eq!(SynapseType::EI.sign(), 1.0);
        assert_eq!(SynapseType::EE.sign(), 1.0);
    }

    #[test]
    fn codes() {
        for syn_type in [SynapseType::II, SynapseType::IE, SynapseType::EI, SynapseType::EE] {
            assert_eq!(SynapseType::from_code(syn_type.code()), Some(syn_type));
        }
        assert_eq!(SynapseType::from_code(4), None);

        assert_eq!(NeuronType::Inhibitory.code(), 1);
        assert_eq!(NeuronType::Excitatory.code(), 2);
    }
}
