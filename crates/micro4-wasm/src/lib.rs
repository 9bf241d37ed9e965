use micro4_core::{
    gates_for_instruction, instructions_for_gate, Command, ControllerConfig, Event,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod host;
pub use host::{HostError, HostReply, HostSession};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format!($($t)*)))
}

/// Serializes into plain JS objects and arrays rather than `Map`s.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// `{ events, circuitError? }` as handed to JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Reply<'a> {
    events: &'a [Event],
    #[serde(skip_serializing_if = "Option::is_none")]
    circuit_error: Option<String>,
}

fn reply_to_js(reply: &HostReply) -> Result<JsValue, JsValue> {
    let circuit_error = reply.circuit_error.as_ref().map(|err| {
        web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
        err.to_string()
    });
    to_js(&Reply {
        events: &reply.events,
        circuit_error,
    })
}

fn host_error(err: &HostError) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
    JsValue::from_str(&err.to_string())
}

/// One controller session with an optional bridged circuit.
///
/// Commands and events cross as JSON-shaped objects tagged by `type`, e.g.
/// `{ "type": "RUN", "speed": 10 }`. `boot`, `send` and `tick` return
/// `{ events, circuitError? }`; `circuitError` is present when the loaded
/// circuit failed to settle on the new CPU state.
#[wasm_bindgen]
pub struct WasmSession {
    inner: HostSession,
}

#[wasm_bindgen]
impl WasmSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self {
            inner: HostSession::new(ControllerConfig::default()),
        }
    }

    /// Initializes the core. The events are `[{ type: "READY" }]`.
    pub fn boot(&mut self) -> Result<JsValue, JsValue> {
        reply_to_js(&self.inner.boot())
    }

    /// Handles one command object and returns the resulting events.
    pub fn send(&mut self, command: JsValue) -> Result<JsValue, JsValue> {
        let command: Command = serde_wasm_bindgen::from_value(command)?;
        reply_to_js(&self.inner.send(command))
    }

    /// Advances an active run by one batch. Call from the host's scheduler.
    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        reply_to_js(&self.inner.tick())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.cpu_state())
    }

    /// Returns a copy of memory as a Uint8Array.
    #[must_use]
    pub fn get_memory(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.inner.cpu_state().memory.as_slice())
    }

    pub fn disassemble(&self, before: usize, after: usize) -> Result<JsValue, JsValue> {
        to_js(&self.inner.disassemble(before, after))
    }

    /// Compiles HDL source. On a compile error the previous circuit stays
    /// loaded and the message, including its line, is thrown. A circuit that
    /// loads but does not settle is kept and the engine error is thrown.
    pub fn load_circuit(&mut self, source: &str) -> Result<JsValue, JsValue> {
        let circuit = self.inner.load_circuit(source).map_err(|e| host_error(&e))?;
        console_log!(
            "Loaded circuit: {} wires, {} gates",
            circuit.wires.len(),
            circuit.gates.len()
        );
        to_js(circuit)
    }

    pub fn load_reference_circuit(&mut self) -> Result<JsValue, JsValue> {
        let circuit = self
            .inner
            .load_reference_circuit()
            .map_err(|e| host_error(&e))?;
        to_js(circuit)
    }

    /// Returns wires and flip-flops to their power-on contents and remirrors
    /// the CPU state.
    pub fn reset_circuit(&mut self) -> Result<JsValue, JsValue> {
        let circuit = self.inner.reset_circuit().map_err(|e| host_error(&e))?;
        to_js(circuit)
    }

    pub fn get_circuit(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.circuit())
    }

    pub fn set_input(&mut self, name: &str, value: u32) -> Result<JsValue, JsValue> {
        let circuit = self
            .inner
            .set_circuit_input(name, u64::from(value))
            .map_err(|e| host_error(&e))?;
        to_js(circuit)
    }

    pub fn clock(&mut self, cycles: u32) -> Result<JsValue, JsValue> {
        let circuit = self
            .inner
            .clock_circuit(u64::from(cycles))
            .map_err(|e| host_error(&e))?;
        to_js(circuit)
    }

    pub fn timing(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.timing())
    }
}

impl Default for WasmSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Gate ids of the reference datapath exercised by `opcode`.
#[wasm_bindgen]
#[must_use]
pub fn gates_for_opcode(opcode: u8) -> Vec<u32> {
    gates_for_instruction(opcode)
}

/// Opcodes whose correlation includes `gate`.
#[wasm_bindgen]
#[must_use]
pub fn opcodes_for_gate(gate: u32) -> Vec<u8> {
    instructions_for_gate(gate)
}
