#![no_main]

use libfuzzer_sys::fuzz_target;
use micro4_core::{disassemble_window, Command, Controller, ControllerConfig, Cpu, CpuConfig};

fuzz_target!(|data: &[u8]| {
    let Some((&size, image)) = data.split_first() else {
        return;
    };

    let mut cpu = Cpu::new(CpuConfig {
        memory_cells: usize::from(size).max(1),
    });
    cpu.load_program(image, 0);
    for _ in 0..512 {
        let before = cpu.snapshot();
        if cpu.step() == 0 {
            assert!(cpu.is_halted());
            assert_eq!(cpu.memory(), before.memory);
            break;
        }
    }

    let _ = disassemble_window(cpu.pc(), 4, 4, &cpu.memory());

    let mut controller = Controller::new(ControllerConfig::default());
    controller.handle(Command::LoadProgram {
        words: image.to_vec(),
        start: 0,
    });
    controller.handle(Command::AddBreakpoint { address: size });
    controller.handle(Command::Run { speed: 0 });
    let _ = controller.tick();
});
