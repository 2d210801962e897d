//! Netlist parser.
//!
//! Parses the textual netlist format into typed circuit elements.
//!
//! # Supported syntax
//!
//! ```text
//! % comment (rest of any line after '%' is ignored)
//! V<idx> n+ n- volts      (voltage source)
//! I<idx> n+ n- amps       (current source)
//! R<idx> n+ n- ohms       (resistor)
//! C<idx> n+ n- farads     (capacitor)
//! L<idx> n+ n- henries    (inductor)
//! D<idx> n+ n-            (diode)
//! Q{N|P}<idx> nc nb ne    (BJT, NPN or PNP)
//! M{N|P}<idx> nd ng ns    (MOSFET, n- or p-channel)
//! ```
//!
//! Element letters are accepted in either case. Values are plain decimal or
//! scientific-notation numbers. No line may exceed 80 characters.

use nom::character::complete::{digit1, space1};
use nom::combinator::map_res;
use nom::number::complete::double;
use nom::IResult;
use nom::Parser;

use crate::error::{Result, VoltaicError};
use crate::ir::{Channel, Element, Netlist, Polarity};

/// Maximum accepted netlist line length.
pub const MAX_LINE_LEN: usize = 80;

/// Parse a netlist string into a `Netlist`.
pub fn parse(input: &str) -> Result<Netlist> {
    let mut elements = Vec::new();

    for (line_num, raw_line) in input.lines().enumerate() {
        if raw_line.len() > MAX_LINE_LEN {
            return Err(VoltaicError::Parse(format!(
                "line {}: longer than {} characters",
                line_num + 1,
                MAX_LINE_LEN
            )));
        }

        // Everything after '%' is a comment.
        let line = raw_line.split('%').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let first = line.chars().next().unwrap();
        let element = match first.to_ascii_uppercase() {
            'V' | 'I' | 'R' | 'C' | 'L' => parse_two_node_line(line),
            'D' => parse_diode_line(line),
            'Q' | 'M' => parse_transistor_line(line),
            other => Err(format!("unknown element '{}'", other)),
        }
        .map_err(|e| parse_err(line_num, raw_line, &e))?;
        elements.push(element);
    }

    Ok(Netlist { elements })
}

fn parse_err(line_num: usize, raw_line: &str, detail: &str) -> VoltaicError {
    VoltaicError::Parse(format!("line {}: {} in: {}", line_num + 1, detail, raw_line))
}

// ---------------------------------------------------------------------------
// Token parsers
// ---------------------------------------------------------------------------

/// Parse an unsigned decimal number (device index or node number).
fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse).parse(input)
}

// ---------------------------------------------------------------------------
// Element line parsers
// ---------------------------------------------------------------------------

/// Parse `X<idx> n+ n- value` for the V, I, R, C, L element kinds.
fn parse_two_node_line(line: &str) -> std::result::Result<Element, String> {
    let kind = line.chars().next().unwrap().to_ascii_uppercase();
    let (_, (idx, _, node_pos, _, node_neg, _, value)) =
        (number, space1, number, space1, number, space1, double)
            .parse(&line[1..])
            .map_err(|_| format!("malformed {} element", kind))?;

    Ok(match kind {
        'V' => Element::Voltage { idx, node_pos, node_neg, volts: value },
        'I' => Element::Current { idx, node_pos, node_neg, amps: value },
        'R' => Element::Resistor { idx, node_pos, node_neg, ohms: value },
        'C' => Element::Capacitor { idx, node_pos, node_neg, farads: value },
        _ => Element::Inductor { idx, node_pos, node_neg, henries: value },
    })
}

/// Parse `D<idx> n+ n-`.
fn parse_diode_line(line: &str) -> std::result::Result<Element, String> {
    let (_, (idx, _, node_pos, _, node_neg)) = (number, space1, number, space1, number)
        .parse(&line[1..])
        .map_err(|_| "malformed diode element".to_string())?;

    Ok(Element::Diode { idx, node_pos, node_neg })
}

/// Parse `Q{N|P}<idx> nc nb ne` or `M{N|P}<idx> nd ng ns`.
fn parse_transistor_line(line: &str) -> std::result::Result<Element, String> {
    let mut chars = line.chars();
    let kind = chars.next().unwrap().to_ascii_uppercase();
    let dope = chars
        .next()
        .ok_or_else(|| "truncated transistor element".to_string())?;
    let rest = &line[kind.len_utf8() + dope.len_utf8()..];

    let (_, (idx, _, node_1, _, node_2, _, node_3)) =
        (number, space1, number, space1, number, space1, number)
            .parse(rest)
            .map_err(|_| format!("malformed {} element", kind))?;

    match (kind, dope.to_ascii_uppercase()) {
        ('Q', 'N') => Ok(Element::Bjt {
            polarity: Polarity::Npn,
            idx,
            node_c: node_1,
            node_b: node_2,
            node_e: node_3,
        }),
        ('Q', 'P') => Ok(Element::Bjt {
            polarity: Polarity::Pnp,
            idx,
            node_c: node_1,
            node_b: node_2,
            node_e: node_3,
        }),
        ('M', 'N') => Ok(Element::Mosfet {
            channel: Channel::N,
            idx,
            node_d: node_1,
            node_g: node_2,
            node_s: node_3,
        }),
        ('M', 'P') => Ok(Element::Mosfet {
            channel: Channel::P,
            idx,
            node_d: node_1,
            node_g: node_2,
            node_s: node_3,
        }),
        (_, other) => Err(format!("unknown doping marker '{}'", other)),
    }
}
