//! Define a looping word, run it, and show its disassembly.
//!
//! Usage: cargo run --example sum_to

use weft::{Session, disassemble_word};

fn main() {
    let mut session = Session::new();

    // SUM-TO: ( n -- sum ) sum of the integers 1..=n.
    session
        .define(
            "SUM-TO",
            "0 SWAP BEGIN DUP 0> WHILE DUP ROT + SWAP 1 - REPEAT DROP",
        )
        .expect("SUM-TO compiles");

    let op = session
        .vocabulary()
        .lookup("SUM-TO")
        .expect("just defined")
        .clone();
    println!("SUM-TO has stack effect {}", op.effect());

    println!("\nDisassembly:");
    let refs = disassemble_word(session.vocabulary(), op.code().expect("composed"))
        .expect("disassembles");
    let mut pos = 0;
    for opref in &refs {
        println!("{:4}  {}", pos, opref);
        pos += opref.width();
    }

    let stack = session.eval("100 SUM-TO").expect("runs");
    println!("\n100 SUM-TO -> {}", stack.last().expect("result"));
}
