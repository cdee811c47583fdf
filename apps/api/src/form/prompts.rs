// Text templates for the bio capability.

/// Bio paragraph template. Replace `{full_name}`, `{specialty}` and
/// `{ai_keyword}` before use.
pub const BIO_TEMPLATE: &str = "{full_name} est un(e) {specialty} passionné(e) avec une expertise en \
{ai_keyword}. Doté(e) d'un excellent sens de l'innovation et d'une approche créative, il/elle \
apporte des solutions modernes et efficaces à chaque projet. Son parcours professionnel témoigne \
d'un engagement constant envers l'excellence et le développement continu de ses compétences.";

/// Field error raised on `aiKeyword` when a bio is requested too early.
pub const BIO_MISSING_INPUTS: &str = "Veuillez remplir le nom, la spécialité et le mot-clé d'abord";

pub fn render_bio(full_name: &str, specialty: &str, ai_keyword: &str) -> String {
    BIO_TEMPLATE
        .replace("{full_name}", full_name)
        .replace("{specialty}", specialty)
        .replace("{ai_keyword}", ai_keyword)
}
