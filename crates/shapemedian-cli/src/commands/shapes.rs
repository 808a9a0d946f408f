use shapemedian_core::ShapeKind;

pub fn run() {
    println!("{} shape kind(s):\n", ShapeKind::ALL.len());
    println!("  {:<12} {:>10}  Area", "Shape", "Distances");
    for kind in ShapeKind::ALL {
        println!(
            "  {:<12} {:>10}  {}",
            kind.name(),
            kind.dimensions(),
            kind.formula()
        );
    }
    let total: usize = ShapeKind::ALL.iter().map(|k| k.dimensions()).sum();
    println!("\n{total} distance samples per full refresh cycle");
}
