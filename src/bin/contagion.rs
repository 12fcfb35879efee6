use contagion::runner::{run_with_args, summary_line};

fn main() {
    match run_with_args() {
        Ok(population) => println!("{}", summary_line(&population)),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
