//! Circuit intermediate representation.
//!
//! The parser produces a `Netlist` of typed circuit elements. The eventual
//! nodal-analysis assembly consumes this IR to build the system matrix.

/// Node identifier in the netlist. Node 0 is the reference (ground) node.
pub type NodeId = u32;

/// Doping pattern of a BJT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Npn,
    Pnp,
}

/// Channel type of a MOSFET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    N,
    P,
}

/// A circuit element parsed from the netlist.
///
/// Two-terminal elements store their `+`/`-` node connections and one value
/// in the element's natural unit. Transistors store their three terminal
/// nodes and a doping/channel marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Voltage {
        idx: u32,
        node_pos: NodeId,
        node_neg: NodeId,
        volts: f64,
    },
    Current {
        idx: u32,
        node_pos: NodeId,
        node_neg: NodeId,
        amps: f64,
    },
    Resistor {
        idx: u32,
        node_pos: NodeId,
        node_neg: NodeId,
        ohms: f64,
    },
    Capacitor {
        idx: u32,
        node_pos: NodeId,
        node_neg: NodeId,
        farads: f64,
    },
    Inductor {
        idx: u32,
        node_pos: NodeId,
        node_neg: NodeId,
        henries: f64,
    },
    Diode {
        idx: u32,
        node_pos: NodeId,
        node_neg: NodeId,
    },
    Bjt {
        polarity: Polarity,
        idx: u32,
        node_c: NodeId,
        node_b: NodeId,
        node_e: NodeId,
    },
    Mosfet {
        channel: Channel,
        idx: u32,
        node_d: NodeId,
        node_g: NodeId,
        node_s: NodeId,
    },
}

impl Element {
    /// The netlist letter identifying this element kind.
    pub fn symbol(&self) -> char {
        match self {
            Element::Voltage { .. } => 'V',
            Element::Current { .. } => 'I',
            Element::Resistor { .. } => 'R',
            Element::Capacitor { .. } => 'C',
            Element::Inductor { .. } => 'L',
            Element::Diode { .. } => 'D',
            Element::Bjt { .. } => 'Q',
            Element::Mosfet { .. } => 'M',
        }
    }

    /// The numeric identifier of this element (the `1` in `R1`).
    pub fn idx(&self) -> u32 {
        match *self {
            Element::Voltage { idx, .. }
            | Element::Current { idx, .. }
            | Element::Resistor { idx, .. }
            | Element::Capacitor { idx, .. }
            | Element::Inductor { idx, .. }
            | Element::Diode { idx, .. }
            | Element::Bjt { idx, .. }
            | Element::Mosfet { idx, .. } => idx,
        }
    }

    /// Terminal nodes of this element, in netlist order.
    pub fn nodes(&self) -> Vec<NodeId> {
        match *self {
            Element::Voltage { node_pos, node_neg, .. }
            | Element::Current { node_pos, node_neg, .. }
            | Element::Resistor { node_pos, node_neg, .. }
            | Element::Capacitor { node_pos, node_neg, .. }
            | Element::Inductor { node_pos, node_neg, .. }
            | Element::Diode { node_pos, node_neg, .. } => vec![node_pos, node_neg],
            Element::Bjt { node_c, node_b, node_e, .. } => vec![node_c, node_b, node_e],
            Element::Mosfet { node_d, node_g, node_s, .. } => vec![node_d, node_g, node_s],
        }
    }
}

/// A parsed netlist: circuit elements in file order.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    pub elements: Vec<Element>,
}

impl Netlist {
    /// Highest node number referenced by any element, or `None` for an
    /// empty netlist. The eventual MNA system has this many non-ground rows.
    pub fn max_node(&self) -> Option<NodeId> {
        self.elements.iter().flat_map(|e| e.nodes()).max()
    }
}
