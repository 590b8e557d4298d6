use mcfg_core::{parse_str, SerializeOptions};

fn main() {
    let mcfg_data = "
sector user
  section profile
    str name 'John Doe'
    str email 'john.doe@example.com'
    str greeting 'Hello $(name) <$(email)>'
    list u16 ports 80, 443
  end
end
";

    match parse_str(mcfg_data, "example.mcfg") {
        Ok(file) => {
            match file.format_field("/user/profile/greeting", "") {
                Ok(greeting) => println!("Formatted greeting: {greeting}"),
                Err(e) => eprintln!("Failed to format greeting: {e:?}"),
            }
            match file.to_json() {
                Ok(json_output) => println!("Successfully parsed MCFG/2 to JSON:\n{json_output}"),
                Err(e) => eprintln!("Failed to export JSON: {e}"),
            }
            match file.serialize(&SerializeOptions::tabs()) {
                Ok(text) => println!("Canonical form:\n{text}"),
                Err(e) => eprintln!("Failed to serialize: {e:?}"),
            }
        }
        Err(e) => {
            eprintln!("Failed to parse MCFG/2: {:?}", miette::Report::new(e));
        }
    }
}
