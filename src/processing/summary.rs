use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::processing::errors::order;

/// Errors measured at one mesh resolution.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionRecord {
    pub n: usize,
    pub h: f64,
    pub l1: f64,
    pub linf: f64,
    pub rela: f64,
}

/// Accumulates per-resolution error records of a refinement study and
/// renders the convergence table.
pub struct ConvergenceSummary {
    pub title: String,
    records: Vec<ResolutionRecord>,
}

impl ConvergenceSummary {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: ResolutionRecord) {
        self.records.push(record);
    }

    fn spacings(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.h).collect()
    }

    /// Estimated convergence orders `(l1, linf, rela)`, once at least two
    /// resolutions have been recorded.
    pub fn orders(&self) -> Option<(f64, f64, f64)> {
        let h = self.spacings();
        let pick = |f: fn(&ResolutionRecord) -> f64| {
            let e: Vec<f64> = self.records.iter().map(f).collect();
            order(&e, &h).ok()
        };
        Some((
            pick(|r| r.l1)?,
            pick(|r| r.linf)?,
            pick(|r| r.rela)?,
        ))
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("{:^60}", self.title.to_uppercase());
        println!("{}", "=".repeat(60));
        println!(
            "{:>6} | {:>10} | {:>10} | {:>10} | {:>10}",
            "N", "h", "l1-error", "linf-error", "rela-error"
        );
        println!("{}", "-".repeat(60));
        for r in &self.records {
            println!(
                "{:>6} | {:>10.4e} | {:>10.4e} | {:>10.4e} | {:>10.4e}",
                r.n, r.h, r.l1, r.linf, r.rela
            );
        }
        if let Some((p1, pinf, prela)) = self.orders() {
            println!("{}", "-".repeat(60));
            println!(
                "Order:   l1 = {:.2}   linf = {:.2}   rela = {:.2}",
                p1, pinf, prela
            );
        }
        println!("{}\n", "=".repeat(60));
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file, "{}", self.title.to_uppercase())?;
        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file)?;
        writeln!(file, "N,h,l1_error,linf_error,rela_error")?;
        for r in &self.records {
            writeln!(
                file,
                "{},{:.15e},{:.15e},{:.15e},{:.15e}",
                r.n, r.h, r.l1, r.linf, r.rela
            )?;
        }
        writeln!(file)?;
        if let Some((p1, pinf, prela)) = self.orders() {
            writeln!(file, "order_l1:   {:.4}", p1)?;
            writeln!(file, "order_linf: {:.4}", pinf)?;
            writeln!(file, "order_rela: {:.4}", prela)?;
        }
        writeln!(file, "{}", "=".repeat(60))?;

        Ok(())
    }
}
