use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "medboard", version, about = "Terminal dashboard for hospital administration")]
pub struct Args {
    /// Page to open on start (e.g., "appointments", "lab-tests")
    #[arg(short, long)]
    pub page: Option<String>,

    /// Rows per table page, overriding the config file
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: Option<u16>,

    /// Print the available pages and exit
    #[arg(long)]
    pub list_pages: bool,
}
