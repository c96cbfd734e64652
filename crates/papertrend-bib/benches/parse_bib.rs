use papertrend_bib::date::{DateDefaults, is_date};
use papertrend_bib::parser::parse_bibliography;
use papertrend_bib::reconcile::reconcile;

fn synthetic_export(records: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(records * 10);
    for n in 1..=records {
        lines.push("Reference Type:  Journal Article".to_string());
        lines.push(format!("Record Number: {n}"));
        lines.push(format!("Author: Author {n}"));
        lines.push(format!("Year: {}", 1990 + n % 30));
        lines.push(format!("Title: Epigenome-wide association study {n}"));
        lines.push("Journal: Clinical Epigenetics".to_string());
        lines.push("Mar 15".to_string());
        lines.push(format!("DOI: 10.1000/{n}"));
        lines.push("Volume: 12".to_string());
        lines.push(String::new());
    }
    lines
}

#[divan::bench]
fn parse_export(bencher: divan::Bencher) {
    let lines = synthetic_export(1_000);
    bencher.bench(|| parse_bibliography(&lines));
}

#[divan::bench]
fn parse_and_reconcile(bencher: divan::Bencher) {
    let lines = synthetic_export(1_000);
    let defaults = DateDefaults::default();
    bencher.bench(|| {
        let mut buffer = parse_bibliography(&lines);
        reconcile(&mut buffer, &defaults)
    });
}

#[divan::bench(args = ["Mar 15", "2019-03-15", "Title: Not a date", "Epigenetics"])]
fn classify(text: &str) -> bool {
    is_date(divan::black_box(text), false)
}

fn main() {
    divan::main();
}
