//! Fail-soft executable container parsing.
//!
//! Only the ELF ident block and machine-type field are consulted; any
//! malformation (short buffer, bad magic, unknown class or data encoding)
//! yields `None`. Metadata is never guessed and never partial.

use serde::{Deserialize, Serialize};

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";
const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const E_MACHINE_OFFSET: usize = 18;

/// Declared word width from the ELF ident block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Class {
    Elf32,
    Elf64,
}

/// Declared byte order from the ELF ident block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endianness {
    Little,
    Big,
}

/// Parsed container metadata; present only when the header parsed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub class: Class,
    pub endianness: Endianness,
    /// Raw `e_machine` value, read with the declared byte order.
    pub machine: u16,
}

impl ContainerInfo {
    /// Attempt to parse an ELF-style header. Never panics; every parse
    /// failure is `None`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < E_MACHINE_OFFSET + 2 {
            return None;
        }
        if &data[..4] != ELF_MAGIC {
            return None;
        }
        let class = match data[EI_CLASS] {
            1 => Class::Elf32,
            2 => Class::Elf64,
            _ => return None,
        };
        let endianness = match data[EI_DATA] {
            1 => Endianness::Little,
            2 => Endianness::Big,
            _ => return None,
        };
        let m = [data[E_MACHINE_OFFSET], data[E_MACHINE_OFFSET + 1]];
        let machine = match endianness {
            Endianness::Little => u16::from_le_bytes(m),
            Endianness::Big => u16::from_be_bytes(m),
        };
        Some(Self {
            class,
            endianness,
            machine,
        })
    }

    /// The label this header contributes to the ranking. Always the raw
    /// machine-code form so unrecognized machines stay rankable.
    pub fn ranking_label(&self) -> String {
        format!("elf_machine_{}", self.machine)
    }

    /// Human-readable architecture name for recognized machine codes.
    /// MIPS endianness is not encoded in `e_machine`; it is resolved from
    /// the ident byte order.
    pub fn machine_name(&self) -> Option<&'static str> {
        match self.machine {
            3 => Some("x86"),
            62 => Some("x86_64"),
            40 => Some("arm"),
            183 => Some("arm64"),
            8 => Some(match self.endianness {
                Endianness::Little => "mips_le",
                Endianness::Big => "mips_be",
            }),
            243 => Some("riscv"),
            20 | 21 => Some("powerpc"),
            _ => None,
        }
    }
}
