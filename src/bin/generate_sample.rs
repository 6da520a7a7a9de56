use anyhow::{Context, Result};

const JOBS: [&str; 8] = [
    "admin.",
    "blue-collar",
    "technician",
    "services",
    "management",
    "retired",
    "student",
    "unemployed",
];
const MARITAL: [&str; 3] = ["married", "single", "divorced"];
const EDUCATION: [&str; 4] = ["basic.9y", "high.school", "professional.course", "university.degree"];
const CONTACT: [&str; 2] = ["cellular", "telephone"];
const MONTHS: [&str; 10] = ["mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
const DAYS: [&str; 5] = ["mon", "tue", "wed", "thu", "fri"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Likelihood that a contact ends with a subscription.
fn acceptance_rate(age: i64, job: &str, contact: &str, month: &str) -> f64 {
    let mut p: f64 = 0.08;
    if age < 25 || age > 60 {
        p += 0.15;
    }
    if job == "student" || job == "retired" {
        p += 0.1;
    }
    if contact == "cellular" {
        p += 0.04;
    }
    if matches!(month, "mar" | "sep" | "oct" | "dec") {
        p += 0.2;
    }
    p.min(0.9)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let n_rows = 2000;

    let output_path = "bank_sample.csv";
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record([
        "age",
        "job",
        "marital",
        "education",
        "default",
        "housing",
        "loan",
        "contact",
        "month",
        "day_of_week",
        "duration",
        "campaign",
        "y",
    ])?;

    let mut accepted = 0;
    for _ in 0..n_rows {
        let age = rng.gauss(40.0, 11.0).round().clamp(17.0, 95.0) as i64;
        let job = if age >= 62 && rng.chance(0.7) {
            "retired"
        } else if age <= 24 && rng.chance(0.5) {
            "student"
        } else {
            rng.pick(&JOBS)
        };
        let contact = rng.pick(&CONTACT);
        let month = rng.pick(&MONTHS);
        let default = if rng.chance(0.2) { "unknown" } else { "no" };
        let housing = if rng.chance(0.52) { "yes" } else { "no" };
        let loan = if rng.chance(0.15) { "yes" } else { "no" };
        let duration = rng.gauss(260.0, 120.0).max(0.0).round() as i64;
        let campaign = 1 + (rng.next_u64() % 6) as i64;

        let y = rng.chance(acceptance_rate(age, job, contact, month));
        if y {
            accepted += 1;
        }

        writer.write_record([
            age.to_string(),
            job.to_string(),
            rng.pick(&MARITAL).to_string(),
            rng.pick(&EDUCATION).to_string(),
            default.to_string(),
            housing.to_string(),
            loan.to_string(),
            contact.to_string(),
            month.to_string(),
            rng.pick(&DAYS).to_string(),
            duration.to_string(),
            campaign.to_string(),
            if y { "yes" } else { "no" }.to_string(),
        ])?;
    }
    writer.flush().context("flushing sample file")?;

    println!("Wrote {n_rows} contacts ({accepted} accepted) to {output_path}");
    Ok(())
}
