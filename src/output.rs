//! Netlist output formatting.
//!
//! Renders circuit elements back into canonical netlist lines, the inverse
//! of the parser. Values print in Rust's shortest round-trip notation, so a
//! written netlist parses back to the same elements.

use crate::error::Result;
use crate::ir::{Channel, Element, Netlist, Polarity};
use std::io::Write;

/// Render one element as a canonical netlist line (no trailing newline).
pub fn format_element(element: &Element) -> String {
    match *element {
        Element::Voltage { idx, node_pos, node_neg, volts } => {
            format!("V{} {} {} {}", idx, node_pos, node_neg, volts)
        }
        Element::Current { idx, node_pos, node_neg, amps } => {
            format!("I{} {} {} {}", idx, node_pos, node_neg, amps)
        }
        Element::Resistor { idx, node_pos, node_neg, ohms } => {
            format!("R{} {} {} {}", idx, node_pos, node_neg, ohms)
        }
        Element::Capacitor { idx, node_pos, node_neg, farads } => {
            format!("C{} {} {} {}", idx, node_pos, node_neg, farads)
        }
        Element::Inductor { idx, node_pos, node_neg, henries } => {
            format!("L{} {} {} {}", idx, node_pos, node_neg, henries)
        }
        Element::Diode { idx, node_pos, node_neg } => {
            format!("D{} {} {}", idx, node_pos, node_neg)
        }
        Element::Bjt { polarity, idx, node_c, node_b, node_e } => {
            let dope = match polarity {
                Polarity::Npn => 'N',
                Polarity::Pnp => 'P',
            };
            format!("Q{}{} {} {} {}", dope, idx, node_c, node_b, node_e)
        }
        Element::Mosfet { channel, idx, node_d, node_g, node_s } => {
            let ch = match channel {
                Channel::N => 'N',
                Channel::P => 'P',
            };
            format!("M{}{} {} {} {}", ch, idx, node_d, node_g, node_s)
        }
    }
}

/// Write a whole netlist, one element per line.
pub fn write_netlist<W: Write>(netlist: &Netlist, writer: &mut W) -> Result<()> {
    for element in &netlist.elements {
        writeln!(writer, "{}", format_element(element))?;
    }
    Ok(())
}
